//! The BMS(.bms/.bme/.bml/.pms) chart format.
//!
//! [`scan_bms`] reads bytes of a chart into a [`BmsFile`], recording syntax level findings into its logs, and [`check::check_bms_file`] runs the semantic checks over it.
//!
//! In detail, our policies are:
//!
//! - Decode as Shift_JIS unless the bytes are detected as UTF-8.
//! - Never abort on a bad line, it is reported and skipped.
//! - Do not evaluate `#RANDOM` blocks, every branch is regarded as active.

pub mod channel;
pub mod check;
pub mod fraction;
pub mod obj;
pub mod scan;

use std::{collections::HashMap, ops::Range};

use thiserror::Error;

use crate::log::{Log, Logs};

pub use self::{
    fraction::Fraction,
    obj::{BmsObj, ObjType, moments},
    scan::scan_bms,
};

/// A fatal error while scanning a BMS file. The file is not checked at all.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanError {
    /// A line is too long to be buffered.
    #[error("line {line_number} is too long: {len} bytes")]
    LineTooLong {
        /// Zero based number of the line.
        line_number: usize,
        /// Length of the line in bytes.
        len: usize,
    },
}

/// A definition of an indexed header command, such as `#WAV01 kick.wav`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexedDef {
    /// Lowercase command name, such as `wav`.
    pub command_name: String,
    /// Lowercase two characters index, such as `0a`.
    pub index: String,
    /// Defined value.
    pub value: String,
}

impl IndexedDef {
    /// The command with its index in upper case, such as `WAV0A`.
    #[must_use]
    pub fn command(&self) -> String {
        format!("{}{}", self.command_name, self.index).to_ascii_uppercase()
    }
}

/// A measure length override from the channel `02`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasureLength {
    /// The measure.
    pub measure: u32,
    /// The length as written.
    pub length: String,
}

impl MeasureLength {
    /// The length as a number, 0 if it cannot be parsed.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.length.parse().unwrap_or(0.0)
    }
}

/// A line which could not be recognized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InvalidLine {
    /// Zero based number of the line.
    pub line_number: usize,
    /// The trimmed line.
    pub text: String,
    /// Byte range of the trimmed line in [`BmsFile::text`].
    pub span: Range<usize>,
}

impl InvalidLine {
    /// Converts into a log.
    #[must_use]
    pub fn to_log(&self) -> Log {
        Log::error(
            format!("Invalid line({}): {}", self.line_number, self.text),
            format!("この行は無効です({}): {}", self.line_number, self.text),
        )
    }
}

/// A header command defined more than once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DuplicateDefinition {
    /// Lowercase command, with its index for indexed commands.
    pub command: String,
    /// The value before the line.
    pub old_value: String,
    /// The value on the line.
    pub new_value: String,
    /// Byte range of the later definition in [`BmsFile::text`].
    pub span: Range<usize>,
}

impl DuplicateDefinition {
    /// Converts into a log.
    #[must_use]
    pub fn to_log(&self) -> Log {
        let command = self.command.to_ascii_uppercase();
        Log::warning(
            format!(
                "#{command} is duplicate: old= {}, new= {}",
                self.old_value, self.new_value
            ),
            format!(
                "#{command}が重複しています: old= {}, new= {}",
                self.old_value, self.new_value
            ),
        )
    }
}

/// A scanned BMS chart.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BmsFile {
    /// Path of the file, relative to its directory when checked as a part of it.
    pub path: String,
    /// Hex SHA-256 of the file bytes.
    pub sha256: String,
    /// Detected number of keys: 5, 7, 9, 10 or 14.
    pub keymode: u32,
    /// Number of notes to be judged.
    pub total_notes: usize,
    /// Header commands by lowercase name.
    pub header: HashMap<String, String>,
    /// `#WAVxx` definitions.
    pub wav_defs: Vec<IndexedDef>,
    /// `#BMPxx` definitions.
    pub bmp_defs: Vec<IndexedDef>,
    /// `#BPMxx` definitions.
    pub bpm_defs: Vec<IndexedDef>,
    /// `#STOPxx` definitions.
    pub stop_defs: Vec<IndexedDef>,
    /// `#SCROLLxx` definitions.
    pub scroll_defs: Vec<IndexedDef>,
    /// Sound objects, sorted by time.
    pub wav_objs: Vec<BmsObj>,
    /// BGA objects, sorted by time.
    pub bmp_objs: Vec<BmsObj>,
    /// Mine objects, sorted by time.
    pub mine_objs: Vec<BmsObj>,
    /// Inline BPM change objects, sorted by time.
    pub bpm_objs: Vec<BmsObj>,
    /// Extended BPM change objects, sorted by time.
    pub extended_bpm_objs: Vec<BmsObj>,
    /// Stop objects, sorted by time.
    pub stop_objs: Vec<BmsObj>,
    /// Scroll speed objects, sorted by time.
    pub scroll_objs: Vec<BmsObj>,
    /// Measure length overrides, sorted by measure.
    pub measure_lengths: Vec<MeasureLength>,
    /// The decoded source text.
    pub text: String,
    /// Lines which could not be recognized.
    pub invalid_lines: Vec<InvalidLine>,
    /// Header commands defined more than once.
    pub duplicates: Vec<DuplicateDefinition>,
    /// Whether the source was detected as UTF-8.
    pub is_utf8: bool,
    /// Findings, in display order.
    pub logs: Logs,
}

impl BmsFile {
    /// Creates an empty file at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Indexed definitions looked up by objects of `obj_type`.
    #[must_use]
    pub fn defs(&self, obj_type: ObjType) -> &[IndexedDef] {
        match obj_type {
            ObjType::Wav | ObjType::Mine => &self.wav_defs,
            ObjType::Bmp => &self.bmp_defs,
            ObjType::ExtendedBpm => &self.bpm_defs,
            ObjType::Stop => &self.stop_defs,
            ObjType::Scroll => &self.scroll_defs,
            ObjType::Bpm => &[],
        }
    }

    /// Placed objects of `obj_type`.
    #[must_use]
    pub fn objs(&self, obj_type: ObjType) -> &[BmsObj] {
        match obj_type {
            ObjType::Wav => &self.wav_objs,
            ObjType::Bmp => &self.bmp_objs,
            ObjType::Mine => &self.mine_objs,
            ObjType::Bpm => &self.bpm_objs,
            ObjType::ExtendedBpm => &self.extended_bpm_objs,
            ObjType::Stop => &self.stop_objs,
            ObjType::Scroll => &self.scroll_objs,
        }
    }

    /// The value defined for `index` of `obj_type`, ignoring ASCII case of the index.
    #[must_use]
    pub fn defined_value(&self, obj_type: ObjType, index: &str) -> Option<&str> {
        self.defs(obj_type)
            .iter()
            .find(|def| def.index.eq_ignore_ascii_case(index))
            .map(|def| def.value.as_str())
    }

    /// The header value of `name`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header.get(name).map(String::as_str)
    }

    /// The lowercase `#LNOBJ` value, or an empty string.
    #[must_use]
    pub fn lnobj(&self) -> String {
        self.header("lnobj")
            .map(str::to_ascii_lowercase)
            .unwrap_or_default()
    }

    /// Renders the logs with a title line, or an empty string if there are no logs.
    #[must_use]
    pub fn log_string(&self, lang: crate::log::Lang) -> String {
        if self.logs.is_empty() {
            return String::new();
        }
        format!("# BmsFile checklog: {}\n{}", self.path, self.logs.render(lang))
    }
}
