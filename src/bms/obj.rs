//! Objects placed on the timeline.

use std::fmt;

use super::{BmsFile, Fraction};

/// Kind of a placed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjType {
    /// Sound, on BGM and note channels.
    Wav,
    /// Background animation.
    Bmp,
    /// Mine, which explodes with `#WAV00`.
    Mine,
    /// Inline BPM change.
    Bpm,
    /// BPM change by `#BPMxx`.
    ExtendedBpm,
    /// Stop by `#STOPxx`.
    Stop,
    /// Scroll speed change by `#SCROLLxx`.
    Scroll,
}

impl ObjType {
    /// Display label. Mines share the label of sounds because they refer `#WAVxx`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Wav | Self::Mine => "WAV",
            Self::Bmp => "BMP",
            Self::Bpm | Self::ExtendedBpm => "BPM",
            Self::Stop => "STOP",
            Self::Scroll => "SCROLL",
        }
    }
}

impl fmt::Display for ObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Formats `value` in lowercase base 36, padded to two digits.
#[must_use]
pub fn to_base36(value: u32) -> String {
    let mut digits = Vec::new();
    let mut rest = value;
    loop {
        digits.push(std::char::from_digit(rest % 36, 36).unwrap_or('0'));
        rest /= 36;
        if rest == 0 {
            break;
        }
    }
    if digits.len() < 2 {
        digits.push('0');
    }
    digits.iter().rev().collect()
}

/// An object placed by a data row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BmsObj {
    /// Kind of the object.
    pub obj_type: ObjType,
    /// Lowercase channel.
    pub channel: String,
    /// Measure where the object is in.
    pub measure: u32,
    /// Position in the measure, not reduced.
    pub position: Fraction,
    /// Base 36 decoded value, 1 to 1295.
    pub value: u32,
    /// Whether the object closes a long note.
    pub is_ln_end: bool,
}

impl BmsObj {
    /// Absolute time in measures.
    #[must_use]
    pub fn time(&self) -> f64 {
        f64::from(self.measure) + self.position.value()
    }

    /// Whether two objects are at the same time, compared exactly.
    #[must_use]
    pub fn same_time(&self, other: &Self) -> bool {
        self.measure == other.measure && self.position.same_value(other.position)
    }

    /// Lowercase two digits base 36 value, such as `0a`.
    #[must_use]
    pub fn value36(&self) -> String {
        to_base36(self.value)
    }

    /// Describes the object as `#001 11 (1/4) #WAV0A`, followed by ` (defined value)` if `file` is given.
    #[must_use]
    pub fn describe(&self, file: Option<&BmsFile>) -> String {
        let value36 = self.value36();
        let defined = file.map_or_else(String::new, |file| {
            format!(
                " ({})",
                file.defined_value(self.obj_type, &value36).unwrap_or("")
            )
        });
        format!(
            "#{:03} {} ({}) #{}{}{}",
            self.measure,
            self.channel,
            self.position,
            self.obj_type.label(),
            value36.to_ascii_uppercase(),
            defined
        )
    }
}

/// Sorts objects by time, keeping the order of objects at the same time.
pub fn sort_by_time(objs: &mut [BmsObj]) {
    objs.sort_by(|a, b| a.time().total_cmp(&b.time()));
}

/// Iterates moments, the runs of objects at the same time, of time sorted `objs`.
///
/// ```rust
/// use bms_check::bms::{BmsObj, Fraction, ObjType, moments};
///
/// let obj = |numerator, denominator| BmsObj {
///     obj_type: ObjType::Wav,
///     channel: "11".into(),
///     measure: 1,
///     position: Fraction::new(numerator, denominator),
///     value: 1,
///     is_ln_end: false,
/// };
/// let objs = [obj(0, 1), obj(1, 2), obj(2, 4), obj(3, 4)];
/// let sizes: Vec<_> = moments(&objs).map(<[_]>::len).collect();
/// assert_eq!(sizes, [1, 2, 1]);
/// ```
pub fn moments(objs: &[BmsObj]) -> impl Iterator<Item = &[BmsObj]> {
    objs.chunk_by(BmsObj::same_time)
}
