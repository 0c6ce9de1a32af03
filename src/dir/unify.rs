//! Checks that sibling charts agree with each other.

use itertools::Itertools;

use crate::{
    bms::{BmsFile, obj::ObjType},
    log::Log,
};

use super::BmsDirectory;

/// Pairs of a BMS header command and the bmson `info` field for the same image or music.
pub const METADATA_PAIRS: &[(Option<&str>, &str)] = &[
    (Some("stagefile"), "eyecatch_image"),
    (Some("banner"), "banner_image"),
    (Some("backbmp"), "title_image"),
    (None, "back_image"),
    (Some("preview"), "preview_music"),
];

#[cfg(feature = "bmson")]
fn info_file<'a>(info: &'a crate::bmson::BmsonInfo, field: &str) -> &'a str {
    match field {
        "eyecatch_image" => &info.eyecatch_image,
        "banner_image" => &info.banner_image,
        "title_image" => &info.title_image,
        "back_image" => &info.back_image,
        "preview_music" => &info.preview_music,
        _ => "",
    }
}

/// Reports images and preview musics which differ among the charts.
pub fn check_metadata_unified(dir: &BmsDirectory) -> Vec<Log> {
    #[cfg(feature = "bmson")]
    let has_bmson = !dir.bmson_files.is_empty();
    #[cfg(not(feature = "bmson"))]
    let has_bmson = false;

    let mut logs = Vec::new();
    for &(command, field) in METADATA_PAIRS {
        let mut values: Vec<(&str, &str)> = Vec::new();
        if let Some(command) = command {
            values.extend(
                dir.bms_files
                    .iter()
                    .map(|file| (file.path.as_str(), file.header(command).unwrap_or(""))),
            );
        }
        #[cfg(feature = "bmson")]
        values.extend(
            dir.bmson_files
                .iter()
                .map(|file| (file.path.as_str(), info_file(&file.bmson.info, field))),
        );
        if values.iter().tuple_windows().all(|(a, b)| a.1 == b.1) {
            continue;
        }

        let label = match command {
            Some(command) if !dir.bms_files.is_empty() => {
                let command = format!("#{}", command.to_ascii_uppercase());
                if has_bmson {
                    format!("{command}(info.{field})")
                } else {
                    command
                }
            }
            _ => format!("info.{field}"),
        };
        logs.push(
            Log::warning(
                format!("{label} are not unified"),
                format!("{label}が統一されていません"),
            )
            .with_detail(values.iter().map(|(path, value)| format!("{path}: {value}"))),
        );
    }
    logs
}

/// Reports groups of charts with the same bytes.
pub fn check_same_hash_charts(dir: &BmsDirectory) -> Vec<Log> {
    let charts = dir.chart_hashes();
    let mut consumed = vec![false; charts.len()];
    let mut logs = Vec::new();
    for (i, &(path, hash)) in charts.iter().enumerate() {
        if consumed.get(i).copied().unwrap_or_default() {
            continue;
        }
        let mut same = vec![path];
        for (j, &(other, other_hash)) in charts.iter().enumerate().skip(i + 1) {
            if other_hash == hash {
                same.push(other);
                if let Some(flag) = consumed.get_mut(j) {
                    *flag = true;
                }
            }
        }
        if same.len() > 1 {
            logs.push(
                Log::warning("These bmsfiles are same", "これらのBMSファイルは同一です")
                    .with_detail(same),
            );
        }
    }
    logs
}

/// Groups the paths by their sequences, in order of the first appearance.
///
/// ```rust
/// use bms_check::dir::unify::group_by_sequence;
///
/// let a = vec!["x".to_string()];
/// let b = vec!["y".to_string()];
/// let groups = group_by_sequence(&[("a.bms", a.clone()), ("b.bms", b), ("c.bms", a)]);
/// assert_eq!(groups, vec![vec!["a.bms", "c.bms"], vec!["b.bms"]]);
/// ```
#[must_use]
pub fn group_by_sequence<'a>(sequences: &[(&'a str, Vec<String>)]) -> Vec<Vec<&'a str>> {
    let mut groups: Vec<(&[String], Vec<&'a str>)> = Vec::new();
    for (path, sequence) in sequences {
        match groups.iter_mut().find(|(seq, _)| *seq == sequence.as_slice()) {
            Some((_, paths)) => paths.push(*path),
            None => groups.push((sequence.as_slice(), vec![*path])),
        }
    }
    groups.into_iter().map(|(_, paths)| paths).collect()
}

fn group_details(groups: &[Vec<&str>]) -> Vec<String> {
    groups
        .iter()
        .enumerate()
        .map(|(i, paths)| format!("Group{}: {}", i + 1, paths.join(", ")))
        .collect()
}

/// `#WAV01 kick.wav` for each definition of `obj_type`.
fn definition_sequence(file: &BmsFile, obj_type: ObjType) -> Vec<String> {
    file.defs(obj_type)
        .iter()
        .map(|def| format!("#{} {}", def.command(), def.value))
        .collect()
}

/// `1-1/4 0a` for each placed object of `obj_type` with a defined value.
fn object_sequence(file: &BmsFile, obj_type: ObjType) -> Vec<String> {
    file.objs(obj_type)
        .iter()
        .filter(|obj| {
            !obj.is_ln_end
                && file
                    .defined_value(obj_type, &obj.value36())
                    .is_some_and(|value| !value.is_empty())
        })
        .map(|obj| format!("{}-{} {}", obj.measure, obj.position.reduced(), obj.value36()))
        .collect()
}

/// Reports `#BMPxx` and `#WAVxx` definitions which differ among the BMS charts.
pub fn check_indexed_definitions_unified(dir: &BmsDirectory) -> Vec<Log> {
    let mut logs = Vec::new();
    for obj_type in [ObjType::Bmp, ObjType::Wav] {
        let sequences: Vec<_> = dir
            .bms_files
            .iter()
            .map(|file| (file.path.as_str(), definition_sequence(file, obj_type)))
            .collect();
        let groups = group_by_sequence(&sequences);
        if groups.len() > 1 {
            let label = obj_type.label();
            logs.push(
                Log::warning(
                    format!("#{label}xx are not unified"),
                    format!("#{label}xxが統一されていません"),
                )
                .with_detail(group_details(&groups)),
            );
        }
    }
    logs
}

/// Reports placements of keysounds and images which differ among the BMS charts.
pub fn check_object_structures_unified(dir: &BmsDirectory) -> Vec<Log> {
    let mut logs = Vec::new();
    for obj_type in [ObjType::Wav, ObjType::Bmp] {
        let sequences: Vec<_> = dir
            .bms_files
            .iter()
            .map(|file| (file.path.as_str(), object_sequence(file, obj_type)))
            .collect();
        let groups = group_by_sequence(&sequences);
        if groups.len() > 1 {
            let label = obj_type.label();
            logs.push(
                Log::warning(
                    format!("{label} object structures are not unified"),
                    format!("{label}オブジェ構成が統一されていません"),
                )
                .with_detail(group_details(&groups)),
            );
        }
    }
    logs
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::env::Utf8Detector;

    fn directory(charts: &[(&str, &str)]) -> BmsDirectory {
        let mut dir = BmsDirectory::new("song");
        for (path, source) in charts {
            dir.add_chart(path, source.as_bytes(), &Utf8Detector).unwrap();
        }
        dir
    }

    #[test]
    fn metadata() {
        let dir = directory(&[
            ("a.bms", "#STAGEFILE a.png\n#BANNER b.png\n"),
            ("b.bms", "#STAGEFILE a.png\n#BANNER c.png\n"),
            ("c.bms", "#STAGEFILE a.png\n"),
        ]);
        let logs = check_metadata_unified(&dir);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "#BANNER are not unified");
        assert_eq!(logs[0].message_ja, "#BANNERが統一されていません");
        assert_eq!(logs[0].sub_logs, vec!["a.bms: b.png", "b.bms: c.png", "c.bms: "]);
    }

    #[cfg(feature = "bmson")]
    #[test]
    fn metadata_with_bmson() {
        let mut dir = directory(&[("a.bms", "#STAGEFILE eye.png\n")]);
        dir.add_chart(
            "b.bmson",
            br#"{"info": {"eyecatch_image": "eye2.png", "back_image": "back.png"}}"#,
            &Utf8Detector,
        )
        .unwrap();
        let logs = check_metadata_unified(&dir);
        let messages: Vec<_> = logs.iter().map(|log| log.message.as_str()).collect();
        assert_eq!(messages, vec!["#STAGEFILE(info.eyecatch_image) are not unified"]);
        assert_eq!(logs[0].sub_logs, vec!["a.bms: eye.png", "b.bmson: eye2.png"]);
    }

    #[test]
    fn same_hash() {
        let dir = directory(&[
            ("a.bms", "#TITLE a\n"),
            ("b.bms", "#TITLE b\n"),
            ("c.bms", "#TITLE a\n"),
            ("d.bms", "#TITLE b\n"),
            ("e.bms", "#TITLE a\n"),
        ]);
        let logs = check_same_hash_charts(&dir);
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].sub_logs, vec!["a.bms", "c.bms", "e.bms"]);
        assert_eq!(logs[1].sub_logs, vec!["b.bms", "d.bms"]);
    }

    #[test]
    fn three_charts_make_two_groups() {
        let dir = directory(&[
            ("a.bms", "#WAV01 a.wav\n#WAV02 b.wav\n#00111:0102\n"),
            ("b.bms", "#WAV01 a.wav\n#WAV02 b.wav\n#00111:0201\n"),
            ("c.bms", "#WAV01 a.wav\n#WAV02 b.wav\n#00111:0102\n"),
        ]);
        assert!(check_indexed_definitions_unified(&dir).is_empty());
        let logs = check_object_structures_unified(&dir);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "WAV object structures are not unified");
        assert_eq!(logs[0].sub_logs, vec!["Group1: a.bms, c.bms", "Group2: b.bms"]);
    }

    #[test]
    fn definitions() {
        let dir = directory(&[
            ("a.bms", "#WAV01 a.wav\n#BMP01 a.bmp\n"),
            ("b.bms", "#WAV01 b.wav\n#BMP01 a.bmp\n"),
        ]);
        let logs = check_indexed_definitions_unified(&dir);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "#WAVxx are not unified");
        assert_eq!(logs[0].sub_logs, vec!["Group1: a.bms", "Group2: b.bms"]);
    }

    #[test]
    fn undefined_objects_are_ignored() {
        let dir = directory(&[
            ("a.bms", "#WAV01 a.wav\n#00111:0102\n"),
            ("b.bms", "#WAV01 a.wav\n#00111:01\n"),
        ]);
        assert!(check_object_structures_unified(&dir).is_empty());
    }
}
