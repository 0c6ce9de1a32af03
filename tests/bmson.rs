#![cfg(feature = "bmson")]

use bms_check::prelude::*;
use pretty_assertions::assert_eq;

fn messages(logs: &[Log]) -> Vec<&str> {
    logs.iter().map(|log| log.message.as_str()).collect()
}

#[test]
fn schema_deviations_are_logged_in_order() {
    let source = r#"{
        "version": "1.0.0",
        "info": {
            "title": "Song",
            "artist": "Artist",
            "genre": "Genre",
            "level": "five",
            "init_bpm": 150,
            "judge_rank": 100,
            "total": 100,
            "mode_hint": "beat-7k",
            "bgm": true
        },
        "sound_channels": [],
        "sound_channels": []
    }"#;
    let file = scan_bmson("song.bmson", source.as_bytes()).unwrap();
    assert_eq!(
        messages(&file.logs),
        vec![
            r#"Invalid field name: {"bgm": true} in root.info"#,
            "root.info.level has invalid value: five",
            "Duplicate field: sound_channels * 2",
        ]
    );
    assert!(!file.has_info_field("level"));
    assert!(file.has_info_field("title"));
}

#[test]
fn missing_required_fields() {
    let file = scan_bmson("song.bmson", b"{}").unwrap();
    let missing: Vec<_> = file
        .logs
        .iter()
        .filter(|log| log.level == Level::Error)
        .map(|log| log.message.as_str())
        .collect();
    assert!(missing.contains(&"Missing required field: root.version"));
    assert!(missing.contains(&"Missing required field: root.info"));
    assert!(missing.contains(&"Missing required field: root.sound_channels"));
    assert_eq!(file.bmson.info.resolution, 240);
    assert_eq!(file.keymode, 7);
}

#[test]
fn malformed_json_is_a_hard_error() {
    assert!(matches!(
        scan_bmson("a.bmson", br#"{"version": "1.0.0",, }"#),
        Err(BmsonError::InvalidJson { errors }) if !errors.is_empty()
    ));
    assert!(matches!(
        scan_bmson("a.bmson", b"[1, 2]"),
        Err(BmsonError::NotAnObject)
    ));
    let log = BmsonError::NotAnObject.to_log();
    assert_eq!(log.level, Level::Error);
    assert!(log.message.starts_with("Invalid bmson format: "));
}

#[test]
fn notes_and_keymode() {
    let source = r#"{
        "version": "1.0.0",
        "info": {"title": "Song", "mode_hint": "popn-9k", "init_bpm": 120},
        "sound_channels": [
            {"name": "a.wav", "notes": [
                {"x": 1, "y": 0, "l": 0, "c": false},
                {"x": 9, "y": 240, "l": 480, "c": false},
                {"x": 10, "y": 480, "l": 0, "c": false},
                {"x": 0, "y": 480, "l": 0, "c": false}
            ]}
        ]
    }"#;
    let file = scan_bmson("song.bmson", source.as_bytes()).unwrap();
    assert_eq!(file.keymode, 9);
    assert_eq!(file.bmson.sound_channels[0].notes.len(), 3);
    assert!(
        file.logs
            .iter()
            .any(|log| log.message == "note.x is out of lane range")
    );
}

#[test]
fn full_check() {
    let source = r#"{
        "version": "1.0.0",
        "info": {
            "title": "Song", "artist": "Artist", "genre": "Genre",
            "mode_hint": "beat-7k", "level": 3, "init_bpm": 150,
            "judge_rank": 100, "total": 300, "resolution": 240
        },
        "lines": [{"y": 0}, {"y": 960}],
        "sound_channels": [
            {"name": "kick.wav", "notes": [{"x": 1, "y": 960, "l": 0, "c": false}]},
            {"name": "unused.wav", "notes": []}
        ]
    }"#;
    let mut file = scan_bmson("song.bmson", source.as_bytes()).unwrap();
    check_bmson_file(&mut file);
    assert!(file.logs.iter().all(|log| log.level != Level::Error), "{:?}", file.logs);
    assert!(file.log_string(Lang::En).starts_with("# BmsFile checklog: song.bmson\n"));
}
