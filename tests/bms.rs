use bms_check::prelude::*;
use pretty_assertions::assert_eq;

fn scan(path: &str, source: &str) -> BmsFile {
    scan_bms(path, source.as_bytes(), &Utf8Detector).unwrap()
}

fn messages(logs: &[Log]) -> Vec<&str> {
    logs.iter().map(|log| log.message.as_str()).collect()
}

#[test]
fn later_header_wins() {
    let file = scan("a.bms", "#TITLE a\n#TITLE b\n");
    assert_eq!(file.header("title"), Some("b"));
    assert_eq!(file.duplicates.len(), 1);
    assert_eq!(file.duplicates[0].old_value, "a");
    assert_eq!(file.duplicates[0].new_value, "b");
    assert_eq!(
        messages(&file.logs),
        vec!["#TITLE is duplicate: old= a, new= b"]
    );
}

#[test]
fn objects_of_a_data_row() {
    let file = scan("a.bms", "#WAV01 a.wav\n#00111:0102000003\n");
    let placed: Vec<_> = file
        .wav_objs
        .iter()
        .map(|obj| (obj.measure, obj.position, obj.value))
        .collect();
    assert_eq!(
        placed,
        vec![
            (1, Fraction::new(0, 5), 1),
            (1, Fraction::new(1, 5), 2),
            (1, Fraction::new(4, 5), 3),
        ]
    );
}

#[test]
fn note_in_ln() {
    let mut file = scan(
        "a.bms",
        "#WAV01 a.wav\n#WAV02 b.wav\n#00251:01\n#00351:01\n#00211:0002\n",
    );
    check_bms_file(&mut file);
    let in_ln: Vec<_> = file
        .logs
        .iter()
        .filter(|log| log.message.contains("is in LN"))
        .collect();
    assert_eq!(in_ln.len(), 1);
    assert_eq!(in_ln[0].level, Level::Error);
    assert!(
        !file
            .logs
            .iter()
            .any(|log| log.message.starts_with("End of LN is missing"))
    );
}

#[test]
fn note_at_ln_end_is_not_in_ln() {
    for note in ["01", "03"] {
        let mut file = scan(
            "a.bms",
            &format!("#WAV01 a.wav\n#WAV02 b.wav\n#WAV03 c.wav\n#00251:02\n#00251:0002\n#00211:00{note}\n"),
        );
        check_bms_file(&mut file);
        assert!(
            !file.logs.iter().any(|log| log.message.contains("is in LN")),
            "note {note}: {:?}",
            file.logs
        );
    }
}

#[test]
fn keymodes() {
    let five = scan("a.bms", "#WAV01 a.wav\n#00111:01\n#00115:01\n#00116:01\n");
    assert_eq!(five.keymode, 5);
    let seven = scan("a.bms", "#WAV01 a.wav\n#00118:01\n");
    assert_eq!(seven.keymode, 7);
    let ten = scan("a.bms", "#WAV01 a.wav\n#00121:01\n");
    assert_eq!(ten.keymode, 10);
    let fourteen = scan("a.bms", "#WAV01 a.wav\n#00119:01\n#00221:01\n");
    assert_eq!(fourteen.keymode, 14);
    let pms = scan("a.pms", "#WAV01 a.wav\n#00111:01\n#00118:01\n");
    assert_eq!(pms.keymode, 9);
}

#[test]
fn total_notes_count_ln_pairs_once() {
    let file = scan(
        "a.bms",
        "#WAV01 a.wav\n#00111:0101\n#00151:0101\n#00152:01000001\n",
    );
    assert_eq!(file.total_notes, 4);
}

#[test]
fn full_check_of_a_minimal_chart() {
    let mut file = scan(
        "song.bms",
        "#PLAYER 1\n#GENRE Genre\n#TITLE Song\n#ARTIST Artist\n#BPM 150\n#PLAYLEVEL 3\n#RANK 2\n#TOTAL 200\n#WAV01 kick.wav\n#00111:01\n",
    );
    check_bms_file(&mut file);
    assert!(file.logs.iter().all(|log| log.level != Level::Error), "{:?}", file.logs);
}

#[test]
fn log_rendering() {
    let mut file = scan("song.bms", "#TITLE a\n#TITLE b\n");
    assert!(file.log_string(Lang::En).starts_with("# BmsFile checklog: song.bms\n"));
    file.logs = Logs::new();
    assert_eq!(file.log_string(Lang::Ja), "");

    let log = Log::warning("Some items", "項目").with_list(["a", "b"]);
    assert_eq!(log.render(Lang::En), "WARNING: Some items: a\nWARNING: Some items: b");
    let log = Log::notice("Groups", "グループ").with_detail(["x"]);
    assert_eq!(log.render(Lang::Ja), "NOTICE: グループ\n  x");
}

#[test]
fn shift_jis_is_decoded() {
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("#TITLE 曲名\n");
    let never_utf8 = |_: &[u8]| false;
    let file = scan_bms("a.bms", &bytes, &never_utf8).unwrap();
    assert_eq!(file.header("title"), Some("曲名"));
    assert!(!file.is_utf8);
}

#[test]
fn too_long_lines_fail() {
    let source = format!("#TITLE {}\n", "a".repeat(1_000_001));
    assert!(matches!(
        scan_bms("a.bms", source.as_bytes(), &Utf8Detector),
        Err(ScanError::LineTooLong { line_number: 0, .. })
    ));
}
