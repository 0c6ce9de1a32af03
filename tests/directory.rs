use bms_check::prelude::*;
use pretty_assertions::assert_eq;

fn directory(charts: &[(&str, &str)], files: &[&str]) -> BmsDirectory {
    let mut dir = BmsDirectory::new("song");
    for (path, source) in charts {
        dir.add_chart(path, source.as_bytes(), &Utf8Detector).unwrap();
    }
    for file in &mut dir.bms_files {
        check_bms_file(file);
    }
    dir.non_bms_files = files.iter().map(NonBmsFile::new).collect();
    dir
}

fn messages(dir: &BmsDirectory) -> Vec<&str> {
    dir.logs.iter().map(|log| log.message.as_str()).collect()
}

#[test]
fn three_charts_make_two_groups() {
    let mut dir = directory(
        &[
            ("1.bms", "#WAV01 a.wav\n#WAV02 b.wav\n#00111:01020102\n"),
            ("2.bms", "#WAV01 a.wav\n#WAV02 b.wav\n#00111:01020102\n#00112:00\n"),
            ("3.bms", "#WAV01 a.wav\n#WAV02 b.wav\n#00111:0201\n"),
        ],
        &["a.ogg", "b.ogg"],
    );
    check_directory(&mut dir, &CheckOptions::default(), &NoAudioProbe);
    let structure = dir
        .logs
        .iter()
        .find(|log| log.message == "WAV object structures are not unified")
        .unwrap();
    assert_eq!(structure.sub_logs, vec!["Group1: 1.bms, 2.bms", "Group2: 3.bms"]);
    assert_eq!(structure.sub_log_type, SubLogType::Detail);
}

#[test]
fn files_and_usage() {
    let mut dir = directory(
        &[(
            "normal.bms",
            "#STAGEFILE stage.png\n#WAV01 kick.wav\n#WAV02 missing.wav\n#BMP01 bg.bmp\n#00111:0102\n#00104:01\n",
        )],
        &["kick.ogg", "bg/../bg.png", "stage.png", "unused.bmp", "readme.txt", "preview.ogg"],
    );
    dir.directories.push(SubDirectory {
        path: "empty".into(),
        is_empty: true,
    });
    let usage = check_directory(&mut dir, &CheckOptions::default(), &NoAudioProbe);

    assert_eq!(
        messages(&dir),
        vec![
            "Defined file does not exist(normal.bms): #WAV02 missing.wav",
            "This file is not used: unused.bmp",
            "This directory is empty: empty",
        ]
    );
    assert_eq!(dir.logs[0].level, Level::Error);
    assert!(usage.get("kick.ogg").by_bms);
    assert!(usage.get("bg.png").by_bms);
    assert!(usage.get("stage.png").by_bms);
    assert!(!usage.get("unused.bmp").by_any());
    assert!(
        dir.bms_files[0]
            .logs
            .iter()
            .any(|log| log.message.starts_with("Notes without keysound (or audio file) exist"))
    );
}

#[test]
fn identical_charts_and_differences() {
    let mut dir = directory(
        &[
            ("a.bms", "#WAV01 a.wav\n#00111:01\n"),
            ("b.bms", "#WAV01 a.wav\n#00111:01\n"),
            ("c.bms", "#WAV01 a.wav\n#WAV02 b.wav\n#00111:0102\n"),
        ],
        &["a.wav", "b.wav"],
    );
    let options = CheckOptions {
        diff: true,
        lang: Lang::En,
    };
    check_directory(&mut dir, &options, &NoAudioProbe);
    assert_eq!(
        messages(&dir),
        vec![
            "These bmsfiles are same",
            "#WAVxx are not unified",
            "WAV object structures are not unified",
            "There are 1 differences in WAV definitions: a.bms c.bms",
            "There are 1 differences in WAV objects: a.bms, c.bms",
            "There are 1 differences in WAV definitions: b.bms c.bms",
            "There are 1 differences in WAV objects: b.bms, c.bms",
        ]
    );
    assert_eq!(dir.logs[0].sub_logs, vec!["a.bms", "b.bms"]);
    assert!(
        dir.log_string(Lang::Ja)
            .starts_with("## BmsDirectory checklog: song\nWARNING: これらのBMSファイルは同一です\n  a.bms\n  b.bms")
    );
}

#[test]
fn long_audio_and_names() {
    let mut dir = directory(
        &[("譜面.bms", "#WAV01 曲.wav\n#00111:01\n")],
        &["曲.ogg", "preview_曲.ogg"],
    );
    let probe = |path: &str| (path == "曲.ogg").then_some(90.0);
    check_directory(&mut dir, &CheckOptions::default(), &probe);
    assert_eq!(
        messages(&dir),
        vec![
            "This filename has environment-dependent characters: 譜面.bms",
            "This filename has environment-dependent characters: 曲.ogg",
            "This filename has environment-dependent characters: preview_曲.ogg",
            "This audio file is over 1 minute(90.0sec): 曲.ogg",
        ]
    );
}

#[cfg(feature = "bmson")]
#[test]
fn bmson_references() {
    let mut dir = directory(
        &[("a.bms", "#STAGEFILE eye.png\n#WAV01 a.wav\n#00111:01\n")],
        &["eye.png", "a.wav", "b.png"],
    );
    dir.add_chart(
        "b.bmson",
        br#"{
            "version": "1.0.0",
            "info": {"title": "Song", "eyecatch_image": "eye.png", "init_bpm": 120},
            "sound_channels": [{"name": "a.ogg", "notes": [{"x": 1, "y": 0, "l": 0, "c": false}]}],
            "bga": {"bga_header": [{"id": 1, "name": "b.bmp"}, {"id": 2, "name": "c.bmp"}]}
        }"#,
        &Utf8Detector,
    )
    .unwrap();
    let usage = check_directory(&mut dir, &CheckOptions::default(), &NoAudioProbe);
    assert_eq!(
        messages(&dir),
        vec!["Defined file does not exist(b.bmson): bga_header[1](id:2) c.bmp"]
    );
    assert_eq!(usage.get("eye.png"), Usage { by_bms: true, by_bmson: true });
    assert!(usage.get("b.png").by_bmson);
}
