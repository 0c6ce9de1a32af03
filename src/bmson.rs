//! The [bmson format](https://bmson-spec.readthedocs.io/en/master/doc/index.html), the JSON based chart format.
//!
//! [`scan_bmson`] parses bytes of a chart into a [`BmsonFile`]. Unlike a strict deserializer, it accepts any JSON object and records every deviation from the schema into the logs of the file: unknown keys, values of wrong types, missing fields, repeated keys and notes out of the lanes. Only malformed JSON is a hard [`BmsonError`].
//!
//! # Usage Example
//!
//! ```rust
//! use bms_check::bmson::{check::check_bmson_file, scan_bmson};
//!
//! let source = r#"{
//!     "version": "1.0.0",
//!     "info": {"title": "Song", "init_bpm": 150, "color": "red"},
//!     "sound_channels": [{"name": "kick.wav", "notes": [{"x": 1, "y": 960, "l": 0, "c": false}]}]
//! }"#;
//! let mut file = scan_bmson("song.bmson", source.as_bytes()).unwrap();
//! assert_eq!(file.total_notes, 1);
//! assert_eq!(
//!     file.logs[0].message,
//!     r#"Invalid field name: {"color": "red"} in root.info"#
//! );
//! check_bmson_file(&mut file);
//! ```

pub mod check;
pub mod parser;
pub mod schema;

use std::{collections::HashMap, fmt, sync::LazyLock};

use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use self::{
    parser::{Json, JsonSyntaxError, format_float, parse_json},
    schema::Record,
};
use crate::{
    env::UTF8_BOM,
    log::{Log, Logs},
};

/// A fatal error while scanning a bmson file. The file is not checked at all.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum BmsonError {
    /// The text is not valid JSON.
    #[error("invalid JSON syntax: {}", .errors.iter().join(", "))]
    InvalidJson {
        /// Syntax errors found in the text.
        errors: Vec<JsonSyntaxError>,
    },
    /// The top level value is not a JSON object.
    #[error("top level value is not an object")]
    NotAnObject,
}

impl BmsonError {
    /// Converts into a log for the file which failed to be scanned.
    #[must_use]
    pub fn to_log(&self) -> Log {
        Log::error(
            format!("Invalid bmson format: {self}"),
            format!("bmsonのフォーマットが無効です: {self}"),
        )
    }
}

/// Top level object of bmson.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bmson {
    /// Version of the format.
    pub version: String,
    /// Metadata of the chart.
    pub info: BmsonInfo,
    /// Bar lines.
    pub lines: Vec<BarLine>,
    /// BPM changes.
    pub bpm_events: Vec<BpmEvent>,
    /// Scroll stops.
    pub stop_events: Vec<StopEvent>,
    /// Sound channels, which hold the notes.
    pub sound_channels: Vec<SoundChannel>,
    /// Background animations.
    pub bga: Bga,
    /// Scroll speed changes, an extension of beatoraja.
    pub scroll_events: Vec<ScrollEvent>,
}

/// Metadata of a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BmsonInfo {
    /// Title.
    pub title: String,
    /// Subtitle.
    pub subtitle: String,
    /// Artist.
    pub artist: String,
    /// Other artists.
    pub subartists: Vec<String>,
    /// Genre.
    pub genre: String,
    /// Layout of the lanes, such as `beat-7k`.
    pub mode_hint: String,
    /// Name of the difficulty, such as `HYPER`.
    pub chart_name: String,
    /// Difficulty level.
    pub level: i64,
    /// BPM at the start.
    pub init_bpm: f64,
    /// Judge width in percent.
    pub judge_rank: f64,
    /// Gauge total in percent of the default one.
    pub total: f64,
    /// Image shown behind the chart.
    pub back_image: String,
    /// Image shown while loading.
    pub eyecatch_image: String,
    /// Image shown in the title.
    pub title_image: String,
    /// Banner image.
    pub banner_image: String,
    /// Music played in the song select.
    pub preview_music: String,
    /// Pulses per quarter note.
    pub resolution: i64,
    /// Kind of long notes, an extension of beatoraja.
    pub ln_type: i64,
}

/// A bar line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BarLine {
    /// Pulse of the line.
    pub y: i64,
}

/// A BPM change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BpmEvent {
    /// Pulse of the change.
    pub y: i64,
    /// New BPM.
    pub bpm: f64,
}

/// A scroll stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StopEvent {
    /// Pulse of the stop.
    pub y: i64,
    /// Length of the stop in pulses.
    pub duration: i64,
}

/// A scroll speed change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollEvent {
    /// Pulse of the change.
    pub y: i64,
    /// Rate of the speed.
    pub rate: f64,
}

/// A sound file and the notes playing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundChannel {
    /// File name of the sound.
    pub name: String,
    /// Notes playing the sound.
    pub notes: Vec<Note>,
}

/// Lane of a note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoteX {
    /// The lane number. `0` is BGM.
    Number(f64),
    /// Not given or `null`, played as BGM.
    #[default]
    Missing,
}

impl NoteX {
    /// The lane if it is a positive integer.
    #[must_use]
    pub fn lane(self) -> Option<i64> {
        match self {
            Self::Number(x) if x > 0.0 && x.fract() == 0.0 => Some(x as i64),
            _ => None,
        }
    }

    /// Whether the note is a number greater than 0, including fractions.
    #[must_use]
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Number(x) if x > 0.0)
    }
}

impl fmt::Display for NoteX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(x) => f.write_str(&format_float(*x)),
            Self::Missing => f.write_str("<nil>"),
        }
    }
}

/// A note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Lane.
    pub x: NoteX,
    /// Pulse.
    pub y: i64,
    /// Length in pulses, `0` for a normal note.
    pub l: i64,
    /// Whether the sound continues from the previous note.
    pub c: bool,
    /// Kind of the long note, an extension of beatoraja.
    pub t: i64,
    /// Whether this is the end of a long note, an extension of beatoraja.
    pub up: bool,
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{x:{} y:{} l:{} c:{} t:{} up:{}}}",
            self.x, self.y, self.l, self.c, self.t, self.up
        )
    }
}

/// Background animations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bga {
    /// Image definitions.
    pub bga_header: Vec<BgaHeader>,
    /// Events of the base layer.
    pub bga_events: Vec<BgaEvent>,
    /// Events of the overlay layer.
    pub layer_events: Vec<BgaEvent>,
    /// Events shown on a miss.
    pub poor_events: Vec<BgaEvent>,
}

/// An image definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BgaHeader {
    /// Id referred by events.
    pub id: i64,
    /// File name of the image.
    pub name: String,
}

/// An image change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BgaEvent {
    /// Pulse of the change.
    pub y: i64,
    /// Id of the image.
    pub id: i64,
}

impl From<&Record> for Note {
    fn from(record: &Record) -> Self {
        Self {
            x: record.number("x").map_or(NoteX::Missing, NoteX::Number),
            y: record.int("y"),
            l: record.int("l"),
            c: record.bool("c"),
            t: record.int("t"),
            up: record.bool("up"),
        }
    }
}

impl From<&Record> for BgaEvent {
    fn from(record: &Record) -> Self {
        Self {
            y: record.int("y"),
            id: record.int("id"),
        }
    }
}

impl From<&Record> for Bga {
    fn from(record: &Record) -> Self {
        let events =
            |name: &str| -> Vec<BgaEvent> { record.array(name).iter().map(BgaEvent::from).collect() };
        Self {
            bga_header: record
                .array("bga_header")
                .iter()
                .map(|header| BgaHeader {
                    id: header.int("id"),
                    name: header.str("name"),
                })
                .collect(),
            bga_events: events("bga_events"),
            layer_events: events("layer_events"),
            poor_events: events("poor_events"),
        }
    }
}

impl From<&Record> for BmsonInfo {
    fn from(record: &Record) -> Self {
        Self {
            title: record.str("title"),
            subtitle: record.str("subtitle"),
            artist: record.str("artist"),
            subartists: record.strings("subartists"),
            genre: record.str("genre"),
            mode_hint: record.str("mode_hint"),
            chart_name: record.str("chart_name"),
            level: record.int("level"),
            init_bpm: record.float("init_bpm"),
            judge_rank: record.float("judge_rank"),
            total: record.float("total"),
            back_image: record.str("back_image"),
            eyecatch_image: record.str("eyecatch_image"),
            title_image: record.str("title_image"),
            banner_image: record.str("banner_image"),
            preview_music: record.str("preview_music"),
            resolution: record.int("resolution"),
            ln_type: record.int("ln_type"),
        }
    }
}

impl From<&Record> for Bmson {
    fn from(record: &Record) -> Self {
        Self {
            version: record.str("version"),
            info: record.object("info").map(BmsonInfo::from).unwrap_or_default(),
            lines: record
                .array("lines")
                .iter()
                .map(|line| BarLine { y: line.int("y") })
                .collect(),
            bpm_events: record
                .array("bpm_events")
                .iter()
                .map(|event| BpmEvent {
                    y: event.int("y"),
                    bpm: event.float("bpm"),
                })
                .collect(),
            stop_events: record
                .array("stop_events")
                .iter()
                .map(|event| StopEvent {
                    y: event.int("y"),
                    duration: event.int("duration"),
                })
                .collect(),
            sound_channels: record
                .array("sound_channels")
                .iter()
                .map(|channel| SoundChannel {
                    name: channel.str("name"),
                    notes: channel.array("notes").iter().map(Note::from).collect(),
                })
                .collect(),
            bga: record.object("bga").map(Bga::from).unwrap_or_default(),
            scroll_events: record
                .array("scroll_events")
                .iter()
                .map(|event| ScrollEvent {
                    y: event.int("y"),
                    rate: event.float("rate"),
                })
                .collect(),
        }
    }
}

/// A scanned bmson chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BmsonFile {
    /// Path of the file, relative to its directory when checked as a part of it.
    pub path: String,
    /// Hex SHA-256 of the file bytes.
    pub sha256: String,
    /// Number of keys from `mode_hint`.
    pub keymode: u32,
    /// Number of notes to be judged.
    pub total_notes: usize,
    /// The decoded chart, notes out of the lanes removed.
    pub bmson: Bmson,
    /// The decoded source text.
    pub text: String,
    /// Fields of `info` which were absent or had values of wrong types.
    pub absent_info_fields: Vec<String>,
    /// Findings, in display order.
    pub logs: Logs,
}

impl BmsonFile {
    /// Creates an empty file at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Whether the `info` field was given with a value of the right type.
    #[must_use]
    pub fn has_info_field(&self, name: &str) -> bool {
        !self.absent_info_fields.iter().any(|absent| absent == name)
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

static KEYS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-(\d+)k").expect("valid regex"));

/// Number of keys for `mode_hint`, 7 if unknown.
///
/// ```rust
/// use bms_check::bmson::keymode;
///
/// assert_eq!(keymode("beat-5k"), 5);
/// assert_eq!(keymode("popn-9k"), 9);
/// assert_eq!(keymode("keyboard-24k-double"), 48);
/// assert_eq!(keymode("generic-6keys"), 7);
/// ```
#[must_use]
pub fn keymode(mode_hint: &str) -> u32 {
    if mode_hint == "keyboard-24k-double" {
        return 48;
    }
    KEYS.captures(mode_hint)
        .and_then(|caps| caps.get(1))
        .and_then(|keys| keys.as_str().parse().ok())
        .unwrap_or(7)
}

/// Whether `lane` is a playable lane of `keymode`.
#[must_use]
pub const fn is_valid_lane(lane: i64, keymode: u32) -> bool {
    match keymode {
        5 => matches!(lane, 1..=5 | 8),
        7 => matches!(lane, 1..=8),
        9 => matches!(lane, 1..=9),
        10 => matches!(lane, 1..=5 | 8..=13 | 16),
        14 => matches!(lane, 1..=16),
        24 => matches!(lane, 1..=26),
        48 => matches!(lane, 1..=52),
        _ => lane >= 1,
    }
}

fn count_total_notes(bmson: &Bmson) -> usize {
    let mut unique: HashMap<(i64, i64), Note> = HashMap::new();
    for note in bmson.sound_channels.iter().flat_map(|channel| &channel.notes) {
        match note.x.lane() {
            Some(lane) if !note.up => {
                unique.insert((lane, note.y), *note);
            }
            _ => {}
        }
    }
    let ln_type = bmson.info.ln_type;
    let long_ends = unique
        .values()
        .filter(|note| note.l > 0 && (note.t >= 2 || (note.t != 1 && ln_type >= 2)))
        .count();
    unique.len() + long_ends
}

fn remove_out_of_lane_notes(bmson: &mut Bmson, keymode: u32) -> Option<Log> {
    let mut out_of_lane = Vec::new();
    for (c, channel) in bmson.sound_channels.iter_mut().enumerate() {
        let notes = std::mem::take(&mut channel.notes);
        for (i, note) in notes.into_iter().enumerate() {
            let in_lane = match note.x {
                NoteX::Missing => true,
                NoteX::Number(x) if x == 0.0 => true,
                NoteX::Number(x) => x.fract() == 0.0 && is_valid_lane(x as i64, keymode),
            };
            if in_lane {
                channel.notes.push(note);
            } else {
                out_of_lane.push(format!(
                    "sound_channels[{c}]({})[{i}] {{x:{}, y:{}}}",
                    channel.name, note.x, note.y
                ));
            }
        }
    }
    (!out_of_lane.is_empty()).then(|| {
        Log::warning(
            "note.x is out of lane range",
            "ノーツのx位置がレーンの範囲外です",
        )
        .with_list(out_of_lane)
    })
}

/// Scans bytes of a bmson chart.
///
/// Findings are recorded in [`BmsonFile::logs`] in this order: unknown keys, values of wrong types, missing fields, repeated keys, and notes out of the lanes.
///
/// # Errors
///
/// Returns [`BmsonError::InvalidJson`] if the text is not valid JSON, or [`BmsonError::NotAnObject`] if it is not an object.
pub fn scan_bmson(path: impl Into<String>, bytes: &[u8]) -> Result<BmsonFile, BmsonError> {
    let mut file = BmsonFile::new(path);
    file.sha256 = hex::encode(Sha256::digest(bytes));
    file.text = String::from_utf8_lossy(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)).into_owned();

    let (json, errors) = parse_json(&file.text);
    if !errors.is_empty() {
        warn!(path = %file.path, errors = errors.len(), "malformed bmson");
        return Err(BmsonError::InvalidJson { errors });
    }
    let root = json.unwrap_or(Json::Invalid);
    let Json::Object(members) = &root else {
        warn!(path = %file.path, "bmson is not an object");
        return Err(BmsonError::NotAnObject);
    };

    let (record, logs) = schema::decode(members);
    file.logs.extend(logs);
    file.logs.extend(schema::duplicate_fields(&root));
    file.absent_info_fields = record
        .object("info")
        .map(|info| info.absent().iter().map(ToString::to_string).collect())
        .unwrap_or_default();
    file.bmson = Bmson::from(&record);

    file.keymode = keymode(&file.bmson.info.mode_hint);
    file.total_notes = count_total_notes(&file.bmson);
    file.logs
        .extend(remove_out_of_lane_notes(&mut file.bmson, file.keymode));

    debug!(
        path = %file.path,
        keymode = file.keymode,
        total_notes = file.total_notes,
        "scanned bmson file"
    );
    Ok(file)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn scan(source: &str) -> BmsonFile {
        scan_bmson("test.bmson", source.as_bytes()).unwrap()
    }

    #[test]
    fn counts_unique_notes_and_long_ends() {
        let file = scan(
            r#"{"version": "1.0.0", "info": {"mode_hint": "beat-7k", "init_bpm": 120, "ln_type": 2},
            "sound_channels": [
                {"name": "a.wav", "notes": [
                    {"x": 1, "y": 0, "l": 0, "c": false},
                    {"x": 1, "y": 0, "l": 0, "c": false},
                    {"x": 2, "y": 0, "l": 240, "c": false},
                    {"x": 3, "y": 0, "l": 240, "c": false, "t": 1},
                    {"x": 0, "y": 0, "l": 0, "c": false},
                    {"y": 10, "c": false},
                    {"x": 4, "y": 10, "c": false, "up": true}
                ]}
            ]}"#,
        );
        assert_eq!(file.total_notes, 4);
        assert_eq!(file.keymode, 7);
    }

    #[test]
    fn removes_notes_out_of_lanes() {
        let file = scan(
            r#"{"version": "1.0.0", "info": {"mode_hint": "beat-5k", "init_bpm": 120},
            "sound_channels": [
                {"name": "a.wav", "notes": [
                    {"x": 6, "y": 0, "c": false},
                    {"x": 8, "y": 0, "c": false},
                    {"x": 1.5, "y": 10, "c": false},
                    {"x": null, "y": 20, "c": false}
                ]}
            ]}"#,
        );
        let log = file.logs.last().unwrap();
        assert_eq!(log.message, "note.x is out of lane range");
        assert_eq!(
            log.sub_logs,
            [
                "sound_channels[0](a.wav)[0] {x:6, y:0}",
                "sound_channels[0](a.wav)[2] {x:1.5, y:10}",
            ]
        );
        let lanes: Vec<NoteX> = file.bmson.sound_channels[0]
            .notes
            .iter()
            .map(|note| note.x)
            .collect();
        assert_eq!(lanes, [NoteX::Number(8.0), NoteX::Missing]);
        assert_eq!(file.total_notes, 2);
    }

    #[test]
    fn hard_errors() {
        let error = scan_bmson("bad.bmson", b"{\"version\": ").unwrap_err();
        assert!(matches!(error, BmsonError::InvalidJson { .. }));
        assert!(error.to_log().message.starts_with("Invalid bmson format: "));
        assert_eq!(
            scan_bmson("list.bmson", b"[1, 2]").unwrap_err(),
            BmsonError::NotAnObject
        );
    }

    #[test]
    fn bom_is_stripped_and_absent_info_fields_are_kept() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(br#"{"version": "1", "info": {"init_bpm": "fast"}, "sound_channels": []}"#);
        let file = scan_bmson("bom.bmson", &bytes).unwrap();
        assert!(file.text.starts_with('{'));
        assert!(!file.has_info_field("init_bpm"));
        assert!(!file.has_info_field("title"));
        assert_eq!(file.bmson.info.mode_hint, "beat-7k");
        assert_eq!(file.bmson.info.resolution, 240);
        assert_eq!(file.bmson.info.total, 100.0);
    }

    #[test]
    fn note_display() {
        let note = Note {
            x: NoteX::Number(1.0),
            y: 5,
            ..Default::default()
        };
        assert_eq!(note.to_string(), "{x:1 y:5 l:0 c:false t:0 up:false}");
        assert_eq!(NoteX::Missing.to_string(), "<nil>");
    }
}
