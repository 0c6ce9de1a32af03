#![cfg(feature = "diagnostics")]

use ariadne::Source;
use bms_check::prelude::*;

fn render(reports: Vec<ariadne::Report<'_, (String, std::ops::Range<usize>)>>, name: &str, text: &str) -> String {
    let mut out = Vec::new();
    for report in reports {
        report
            .write((name.to_string(), Source::from(text)), &mut out)
            .unwrap();
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[test]
fn bms_reports_point_at_lines() {
    let file = scan_bms(
        "song.bms",
        b"#TITLE Song\n#WAV01 a.wav\n#WAV01 b.wav\n#00111:0\n",
        &Utf8Detector,
    )
    .unwrap();
    assert_eq!(file.duplicates.len(), 1);
    assert_eq!(file.invalid_lines.len(), 1);

    let reports = collect_bms_file_reports(&file);
    assert_eq!(reports.len(), 2);
    let rendered = render(reports, &file.path, &file.text);
    assert!(rendered.contains("#WAV01 is defined twice"));
    assert!(rendered.contains("invalid command at line 4"));
    assert!(rendered.contains("song.bms"));
}

#[test]
fn custom_reports() {
    let text = "#TITLE Song\n";
    let source = SimpleSource::new("song.bms", text);
    let report = build_report(
        &source,
        ariadne::ReportKind::Advice,
        1..6,
        "title",
        "here",
        ariadne::Color::Green,
    );
    let rendered = render(vec![report], source.name(), source.text());
    assert!(rendered.contains("title"));
}

#[cfg(feature = "bmson")]
#[test]
fn json_reports() {
    let text = r#"{"version": "1.0.0" "info": {}}"#;
    let Err(BmsonError::InvalidJson { errors }) = scan_bmson("song.bmson", text.as_bytes()) else {
        panic!("expected a syntax error");
    };
    let source = SimpleSource::new("song.bmson", text);
    let reports = errors.iter().map(|error| error.to_report(&source)).collect();
    let rendered = render(reports, "song.bmson", text);
    assert!(rendered.contains("invalid JSON syntax"));
}
