//! Checks between the charts and the other files of a folder.

use crate::{
    bms::{check as bms_check, obj::ObjType},
    command::{AUDIO_EXTS, IMAGE_EXTS, MOVIE_EXTS},
    env::AudioProbe,
    log::{Level, Log},
    path::{clean, extension, has_ext, has_multibyte, strip_extension},
};

use super::{BmsDirectory, NonBmsFile, UsageMap};

#[cfg(feature = "bmson")]
use crate::bmson::check as bmson_check;

/// Extensions of files which are never reported as unused.
pub const IGNORED_EXTS: &[&str] = &[".txt", ".zip", ".rar", ".lzh", ".7z"];

/// Audio files longer than this are reported.
pub const LONG_AUDIO_SECONDS: f64 = 60.0;

/// Paths of the files which `defined` refers.
///
/// `defined` matches a file of the same path ignoring case. With `exts`, it also matches a file which has the same path without extension and one of `exts`, as players look for other formats of the same name.
#[must_use]
pub fn find_files<'a>(files: &'a [NonBmsFile], defined: &str, exts: &[&str]) -> Vec<&'a str> {
    let defined = clean(&defined.to_lowercase());
    files
        .iter()
        .map(|file| file.path.as_str())
        .filter(|path| {
            let real = path.to_lowercase();
            real == defined
                || (!exts.is_empty()
                    && has_ext(&real, exts)
                    && strip_extension(&real) == strip_extension(&defined))
        })
        .collect()
}

/// Whether `path` is a preview music, which players find by its name.
#[must_use]
pub fn is_preview(path: &str) -> bool {
    path.to_lowercase().starts_with("preview") && has_ext(path, AUDIO_EXTS)
}

fn bmp_exts(value: &str) -> Vec<&'static str> {
    if has_ext(value, MOVIE_EXTS) {
        MOVIE_EXTS.iter().chain(IMAGE_EXTS).copied().collect()
    } else {
        IMAGE_EXTS.to_vec()
    }
}

/// A file reference of a chart.
struct Reference<'a> {
    label: String,
    value: &'a str,
    exts: Vec<&'static str>,
    level: Level,
}

impl<'a> Reference<'a> {
    fn new(label: impl Into<String>, value: &'a str, exts: &[&'static str], level: Level) -> Self {
        Self {
            label: label.into(),
            value,
            exts: exts.to_vec(),
            level,
        }
    }
}

fn bms_references(file: &crate::bms::BmsFile) -> Vec<Reference<'_>> {
    let mut refs = Vec::new();
    for (name, exts) in [
        ("stagefile", &[][..]),
        ("banner", &[][..]),
        ("backbmp", &[][..]),
        ("preview", AUDIO_EXTS),
    ] {
        if let Some(value) = file.header(name) {
            refs.push(Reference::new(
                format!("#{}", name.to_ascii_uppercase()),
                value,
                exts,
                Level::Warning,
            ));
        }
    }
    for def in file.defs(ObjType::Wav) {
        refs.push(Reference::new(
            format!("#{}", def.command()),
            &def.value,
            AUDIO_EXTS,
            Level::Error,
        ));
    }
    for def in file.defs(ObjType::Bmp) {
        refs.push(Reference::new(
            format!("#{}", def.command()),
            &def.value,
            &bmp_exts(&def.value),
            Level::Error,
        ));
    }
    refs
}

#[cfg(feature = "bmson")]
fn bmson_references(file: &crate::bmson::BmsonFile) -> Vec<Reference<'_>> {
    let info = &file.bmson.info;
    let mut refs = vec![
        Reference::new("info.back_image", &info.back_image, &[], Level::Warning),
        Reference::new("info.eyecatch_image", &info.eyecatch_image, &[], Level::Warning),
        Reference::new("info.title_image", &info.title_image, &[], Level::Warning),
        Reference::new("info.banner_image", &info.banner_image, &[], Level::Warning),
        Reference::new("info.preview_music", &info.preview_music, AUDIO_EXTS, Level::Warning),
    ];
    for (i, channel) in file.bmson.sound_channels.iter().enumerate() {
        refs.push(Reference::new(
            format!("sound_channel[{i}]"),
            &channel.name,
            AUDIO_EXTS,
            Level::Error,
        ));
    }
    for (i, header) in file.bmson.bga.bga_header.iter().enumerate() {
        refs.push(Reference::new(
            format!("bga_header[{i}](id:{})", header.id),
            &header.name,
            &bmp_exts(&header.name),
            Level::Error,
        ));
    }
    refs
}

fn check_references(
    chart_path: &str,
    refs: &[Reference<'_>],
    files: &[NonBmsFile],
    usage: &mut UsageMap,
    by_bmson: bool,
) -> Vec<Log> {
    let mut logs = Vec::new();
    for reference in refs.iter().filter(|reference| !reference.value.is_empty()) {
        let found = find_files(files, reference.value, &reference.exts);
        if found.is_empty() {
            logs.push(Log::new(
                reference.level,
                format!(
                    "Defined file does not exist({chart_path}): {} {}",
                    reference.label, reference.value
                ),
                format!(
                    "定義されているファイルが実在しません({chart_path}): {} {}",
                    reference.label, reference.value
                ),
            ));
        }
        for path in found {
            usage.mark(path, by_bmson);
        }
    }
    logs
}

/// Reports files referred by the charts but missing in the folder, and marks the found ones in `usage`.
pub fn check_defined_files_exist(dir: &BmsDirectory, usage: &mut UsageMap) -> Vec<Log> {
    let mut logs = Vec::new();
    for file in &dir.bms_files {
        logs.extend(check_references(
            &file.path,
            &bms_references(file),
            &dir.non_bms_files,
            usage,
            false,
        ));
    }
    #[cfg(feature = "bmson")]
    for file in &dir.bmson_files {
        logs.extend(check_references(
            &file.path,
            &bmson_references(file),
            &dir.non_bms_files,
            usage,
            true,
        ));
    }
    logs
}

/// Appends keysound coverage to each chart, regarding keysounds of missing files as silent.
pub fn check_keysounds_exist(dir: &mut BmsDirectory) {
    let files = &dir.non_bms_files;
    let exists = |value: &str| !find_files(files, value, AUDIO_EXTS).is_empty();
    for file in &mut dir.bms_files {
        let logs = bms_check::check_without_keysound(file, Some(&exists));
        file.logs.extend(logs);
    }
    #[cfg(feature = "bmson")]
    for file in &mut dir.bmson_files {
        let logs = bmson_check::check_without_keysound(file, Some(&exists));
        file.logs.extend(logs);
    }
}

/// Reports files which no chart uses.
pub fn check_unused_files(dir: &BmsDirectory, usage: &UsageMap) -> Vec<Log> {
    dir.non_bms_files
        .iter()
        .filter(|file| {
            !usage.get(&file.path).by_any()
                && !has_ext(&file.path, IGNORED_EXTS)
                && !is_preview(&file.path)
        })
        .map(|file| {
            Log::notice(
                format!("This file is not used: {}", file.path),
                format!("このファイルは使用されていません: {}", file.path),
            )
        })
        .collect()
}

/// Reports directories without entries.
pub fn check_empty_directories(dir: &BmsDirectory) -> Vec<Log> {
    dir.directories
        .iter()
        .filter(|sub| sub.is_empty)
        .map(|sub| {
            Log::notice(
                format!("This directory is empty: {}", sub.path),
                format!("このフォルダは空です: {}", sub.path),
            )
        })
        .collect()
}

/// Reports names with characters out of ASCII, of the charts and the files they need.
pub fn check_environment_dependent_names(dir: &BmsDirectory, usage: &UsageMap) -> Vec<Log> {
    let charts = dir.chart_hashes().into_iter().map(|(path, _)| path);
    let needed = dir
        .non_bms_files
        .iter()
        .map(|file| file.path.as_str())
        .filter(|path| {
            usage.get(path).by_any() || extension(path).eq_ignore_ascii_case(".txt") || is_preview(path)
        });
    charts
        .chain(needed)
        .filter(|path| has_multibyte(path))
        .map(|path| {
            Log::warning(
                format!("This filename has environment-dependent characters: {path}"),
                format!("このファイル名は環境依存文字を含んでいます: {path}"),
            )
        })
        .collect()
}

/// Reports used audio files of a minute or longer.
pub fn check_long_audio_files(
    dir: &BmsDirectory,
    usage: &UsageMap,
    probe: &impl AudioProbe,
) -> Vec<Log> {
    dir.non_bms_files
        .iter()
        .filter(|file| has_ext(&file.path, AUDIO_EXTS) && usage.get(&file.path).by_any())
        .filter_map(|file| {
            let duration = probe.duration(&file.path)?;
            (duration >= LONG_AUDIO_SECONDS).then(|| {
                Log::warning(
                    format!("This audio file is over 1 minute({duration:.1}sec): {}", file.path),
                    format!("この音声ファイルは1分以上あります({duration:.1}sec): {}", file.path),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{dir::SubDirectory, env::Utf8Detector};

    fn files(paths: &[&str]) -> Vec<NonBmsFile> {
        paths.iter().map(NonBmsFile::new).collect()
    }

    fn messages(logs: &[Log]) -> Vec<&str> {
        logs.iter().map(|log| log.message.as_str()).collect()
    }

    #[test]
    fn finds_files_by_other_extensions() {
        let files = files(&["wav/Kick.ogg", "wav/kick.png", "bg.bmp"]);
        assert_eq!(find_files(&files, "WAV\\kick.wav", AUDIO_EXTS), vec!["wav/Kick.ogg"]);
        assert_eq!(find_files(&files, "./bg.bmp", &[]), vec!["bg.bmp"]);
        assert_eq!(find_files(&files, "bg.png", &[]), Vec::<&str>::new());
        assert_eq!(find_files(&files, "bg.png", IMAGE_EXTS), vec!["bg.bmp"]);
    }

    #[test]
    fn previews() {
        assert!(is_preview("preview_music.ogg"));
        assert!(is_preview("Preview.WAV"));
        assert!(!is_preview("sub/preview.ogg"));
        assert!(!is_preview("preview.png"));
    }

    fn directory() -> BmsDirectory {
        let mut dir = BmsDirectory::new("song");
        dir.add_chart(
            "a.bms",
            b"#STAGEFILE stage.png\n#PREVIEW pre.wav\n#WAV01 kick.wav\n#WAV02 snare.wav\n#BMP01 bga.mpg\n#00111:0102\n",
            &Utf8Detector,
        )
        .unwrap();
        dir.non_bms_files = files(&["kick.ogg", "bga.mp4", "readme.txt", "unused.png", "preview.ogg"]);
        dir
    }

    #[test]
    fn missing_files_and_usage() {
        let dir = directory();
        let mut usage = UsageMap::new();
        let logs = check_defined_files_exist(&dir, &mut usage);
        assert_eq!(
            messages(&logs),
            vec![
                "Defined file does not exist(a.bms): #STAGEFILE stage.png",
                "Defined file does not exist(a.bms): #PREVIEW pre.wav",
                "Defined file does not exist(a.bms): #WAV02 snare.wav",
            ]
        );
        assert_eq!(logs[0].level, Level::Warning);
        assert_eq!(logs[2].level, Level::Error);
        assert!(usage.get("kick.ogg").by_bms);
        assert!(usage.get("bga.mp4").by_bms);

        assert_eq!(
            messages(&check_unused_files(&dir, &usage)),
            vec!["This file is not used: unused.png"]
        );
    }

    #[test]
    fn keysounds_of_missing_files() {
        let mut dir = directory();
        let before = dir.bms_files[0].logs.len();
        check_keysounds_exist(&mut dir);
        let added = &dir.bms_files[0].logs[before..];
        assert_eq!(
            messages(added),
            vec![
                "Moments without keysound (or audio file) exist: 50.0%(1/2)",
                "Notes without keysound (or audio file) exist: 50.0%(1/2)",
            ]
        );
    }

    #[test]
    fn empty_directories_and_names() {
        let mut dir = directory();
        dir.directories = vec![
            SubDirectory { path: "bga".into(), is_empty: true },
            SubDirectory { path: "wav".into(), is_empty: false },
        ];
        dir.non_bms_files.push(NonBmsFile::new("説明.txt"));
        dir.non_bms_files.push(NonBmsFile::new("未使用.png"));
        assert_eq!(
            messages(&check_empty_directories(&dir)),
            vec!["This directory is empty: bga"]
        );
        assert_eq!(
            messages(&check_environment_dependent_names(&dir, &UsageMap::new())),
            vec!["This filename has environment-dependent characters: 説明.txt"]
        );
    }

    #[test]
    fn long_audio_files() {
        let dir = directory();
        let mut usage = UsageMap::new();
        usage.mark("kick.ogg", true);
        let probe = |path: &str| (path == "kick.ogg").then_some(75.0);
        assert_eq!(
            messages(&check_long_audio_files(&dir, &usage, &probe)),
            vec!["This audio file is over 1 minute(75.0sec): kick.ogg"]
        );
        assert!(check_long_audio_files(&dir, &UsageMap::new(), &probe).is_empty());
    }
}
