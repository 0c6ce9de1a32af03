//! Fancy diagnostics support using `ariadne`.
//!
//! Some findings point at a range of the source text: lines of BMS which could not be recognized, BMS header commands defined twice, and JSON syntax errors of bmson. This module converts them into `ariadne::Report`, which calculates rows and columns from the byte ranges.
//!
//! # Usage Example
//!
//! ```rust
//! # #[cfg(feature = "diagnostics")]
//! # {
//! use bms_check::{bms::scan_bms, diagnostics::emit_bms_file_diagnostics, env::Utf8Detector};
//!
//! let file = scan_bms("test.bms", b"#TITLE Test\n#TITLE Again\nnot a command\n", &Utf8Detector)
//!     .unwrap();
//!
//! // Outputs a warning for the duplicate and an error for the invalid line
//! emit_bms_file_diagnostics(&file);
//! # }
//! ```

#[cfg(feature = "diagnostics")]
use ariadne::{Color, Label, Report, ReportKind, Source};

#[cfg(feature = "diagnostics")]
use crate::bms::{BmsFile, DuplicateDefinition, InvalidLine};
#[cfg(all(feature = "diagnostics", feature = "bmson"))]
use crate::bmson::parser::JsonSyntaxError;

/// Simple source container that holds the filename and source text.
///
/// ```rust
/// use bms_check::diagnostics::SimpleSource;
///
/// let source_text = "#TITLE test\n#ARTIST composer\n";
/// let source = SimpleSource::new("test.bms", source_text);
///
/// assert_eq!(source.text(), source_text);
/// assert_eq!(source.name(), "test.bms");
/// ```
pub struct SimpleSource<'a> {
    name: &'a str,
    text: &'a str,
}

impl<'a> SimpleSource<'a> {
    /// Creates a new source container.
    #[must_use]
    pub const fn new(name: &'a str, text: &'a str) -> Self {
        Self { name, text }
    }

    /// Source text content.
    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    /// Source file name.
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }
}

/// Trait for converting findings with source ranges to `ariadne::Report`.
#[cfg(feature = "diagnostics")]
pub trait ToAriadne {
    /// Converts into an ariadne report over `src`.
    fn to_report<'a>(&self, src: &SimpleSource<'a>)
    -> Report<'a, (String, std::ops::Range<usize>)>;
}

/// Helper to build a styled ariadne `Report` consistently.
#[cfg(feature = "diagnostics")]
#[must_use]
pub fn build_report<'a>(
    src: &SimpleSource<'a>,
    kind: ReportKind<'a>,
    range: std::ops::Range<usize>,
    title: &str,
    label_message: impl ToString,
    color: Color,
) -> Report<'a, (String, std::ops::Range<usize>)> {
    let filename = src.name().to_string();
    Report::build(kind, (filename.clone(), range.clone()))
        .with_message(title)
        .with_label(
            Label::new((filename, range))
                .with_message(label_message.to_string())
                .with_color(color),
        )
        .finish()
}

#[cfg(feature = "diagnostics")]
impl ToAriadne for InvalidLine {
    fn to_report<'a>(
        &self,
        src: &SimpleSource<'a>,
    ) -> Report<'a, (String, std::ops::Range<usize>)> {
        build_report(
            src,
            ReportKind::Error,
            self.span.clone(),
            &format!("invalid command at line {}", self.line_number + 1),
            "this line is not a valid command",
            Color::Red,
        )
    }
}

#[cfg(feature = "diagnostics")]
impl ToAriadne for DuplicateDefinition {
    fn to_report<'a>(
        &self,
        src: &SimpleSource<'a>,
    ) -> Report<'a, (String, std::ops::Range<usize>)> {
        build_report(
            src,
            ReportKind::Warning,
            self.span.clone(),
            &format!("#{} is defined twice", self.command.to_ascii_uppercase()),
            format!("overrides {:?} with {:?}", self.old_value, self.new_value),
            Color::Yellow,
        )
    }
}

#[cfg(all(feature = "diagnostics", feature = "bmson"))]
impl ToAriadne for JsonSyntaxError {
    fn to_report<'a>(
        &self,
        src: &SimpleSource<'a>,
    ) -> Report<'a, (String, std::ops::Range<usize>)> {
        build_report(
            src,
            ReportKind::Error,
            self.span.clone(),
            "invalid JSON syntax",
            &self.message,
            Color::Red,
        )
    }
}

/// Collects reports of the duplicate definitions and invalid lines of `file`, in source order, without printing.
#[cfg(feature = "diagnostics")]
#[must_use]
pub fn collect_bms_file_reports(file: &BmsFile) -> Vec<Report<'_, (String, std::ops::Range<usize>)>> {
    let simple = SimpleSource::new(&file.path, &file.text);
    let mut ranged: Vec<(usize, Report<'_, _>)> = file
        .duplicates
        .iter()
        .map(|dup| (dup.span.start, dup.to_report(&simple)))
        .chain(
            file.invalid_lines
                .iter()
                .map(|line| (line.span.start, line.to_report(&simple))),
        )
        .collect();
    ranged.sort_by_key(|(start, _)| *start);
    ranged.into_iter().map(|(_, report)| report).collect()
}

/// Prints reports of the duplicate definitions and invalid lines of `file` to stderr.
#[cfg(feature = "diagnostics")]
pub fn emit_bms_file_diagnostics(file: &BmsFile) {
    let source = Source::from(file.text.as_str());
    for report in collect_bms_file_reports(file) {
        let _ = report.eprint((file.path.clone(), source.clone()));
    }
}

/// Prints reports of JSON syntax errors of the bmson text to stderr.
///
/// ```rust
/// # #[cfg(all(feature = "diagnostics", feature = "bmson"))]
/// # {
/// use bms_check::{
///     bmson::{BmsonError, scan_bmson},
///     diagnostics::emit_bmson_errors,
/// };
///
/// let text = r#"{"version": }"#;
/// if let Err(BmsonError::InvalidJson { errors }) = scan_bmson("broken.bmson", text.as_bytes()) {
///     emit_bmson_errors("broken.bmson", text, &errors);
/// }
/// # }
/// ```
#[cfg(all(feature = "diagnostics", feature = "bmson"))]
pub fn emit_bmson_errors<'a>(
    name: &'a str,
    source: &'a str,
    errors: impl IntoIterator<Item = &'a JsonSyntaxError>,
) {
    let simple = SimpleSource::new(name, source);
    let ariadne_source = Source::from(source);
    for error in errors {
        let report = error.to_report(&simple);
        let _ = report.eprint((name.to_string(), ariadne_source.clone()));
    }
}

#[cfg(all(test, feature = "diagnostics"))]
mod tests {
    use super::*;
    use crate::{bms::scan_bms, env::Utf8Detector};

    #[test]
    fn reports_are_in_source_order() {
        let file = scan_bms(
            "test.bms",
            b"garbage\n#TITLE a\n#TITLE b\n#0011:01\n",
            &Utf8Detector,
        )
        .unwrap();
        let reports = collect_bms_file_reports(&file);
        assert_eq!(reports.len(), file.duplicates.len() + file.invalid_lines.len());
        assert_eq!(file.duplicates.len(), 1);

        let mut out = Vec::new();
        for report in reports {
            report
                .write(("test.bms".to_string(), Source::from(file.text.as_str())), &mut out)
                .unwrap();
        }
        let rendered = String::from_utf8_lossy(&out);
        let invalid = rendered.find("invalid command at line 1").unwrap();
        let duplicate = rendered.find("#TITLE is defined twice").unwrap();
        assert!(invalid < duplicate);
    }

    #[cfg(feature = "bmson")]
    #[test]
    fn json_syntax_errors() {
        let text = r#"{"version": }"#;
        let (_, errors) = crate::bmson::parser::parse_json(text);
        assert!(!errors.is_empty());
        let simple = SimpleSource::new("a.bmson", text);
        let mut out = Vec::new();
        errors[0]
            .to_report(&simple)
            .write(("a.bmson".to_string(), Source::from(text)), &mut out)
            .unwrap();
        assert!(String::from_utf8_lossy(&out).contains("invalid JSON syntax"));
    }
}
