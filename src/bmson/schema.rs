//! Descriptor tables of the bmson schema, and the decoding walk over them.
//!
//! Each schema struct has a table of [`FieldSpec`]s. [`decode`] walks the parsed [`Json`] along the tables into [`Record`]s, reporting unknown keys, values of wrong types and missing fields instead of failing. Typed structs are then built from the records.

use std::collections::HashMap;

use super::parser::Json;
use crate::{command::Necessity, log::Log};

/// Expected type of a field.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    /// A string.
    Str,
    /// An integral number.
    Int,
    /// Any number.
    Float,
    /// `true` or `false`.
    Bool,
    /// A number or `null`, the lane of a note.
    Number,
    /// An array of strings.
    Strings,
    /// An object described by the table.
    Object(&'static [FieldSpec]),
    /// An array of objects described by the table.
    Array(&'static [FieldSpec]),
}

/// Value substituted for an absent field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    /// The zero value of the type.
    Zero,
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A string.
    Str(&'static str),
}

/// A field of a schema struct.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Lowercase key.
    pub name: &'static str,
    /// Expected type.
    pub kind: Kind,
    /// How much the field is required.
    pub necessity: Necessity,
    /// Value used when the field is absent.
    pub fallback: Fallback,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: Kind, necessity: Necessity) -> Self {
        Self {
            name,
            kind,
            necessity,
            fallback: Fallback::Zero,
        }
    }

    const fn or(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }
}

use Kind::*;
use Necessity::*;

/// Fields of a note.
pub const NOTE: &[FieldSpec] = &[
    FieldSpec::new("x", Number, Unnecessary),
    FieldSpec::new("y", Int, Necessary),
    FieldSpec::new("l", Int, Unnecessary),
    FieldSpec::new("c", Bool, Necessary),
    FieldSpec::new("t", Int, Unnecessary),
    FieldSpec::new("up", Bool, Unnecessary),
];

/// Fields of a sound channel.
pub const SOUND_CHANNEL: &[FieldSpec] = &[
    FieldSpec::new("name", Str, Necessary),
    FieldSpec::new("notes", Array(NOTE), Necessary),
];

/// Fields of a bar line.
pub const BAR_LINE: &[FieldSpec] = &[FieldSpec::new("y", Int, Necessary)];

/// Fields of a BPM event.
pub const BPM_EVENT: &[FieldSpec] = &[
    FieldSpec::new("y", Int, Necessary),
    FieldSpec::new("bpm", Float, Necessary),
];

/// Fields of a stop event.
pub const STOP_EVENT: &[FieldSpec] = &[
    FieldSpec::new("y", Int, Necessary),
    FieldSpec::new("duration", Int, Necessary),
];

/// Fields of a scroll event.
pub const SCROLL_EVENT: &[FieldSpec] = &[
    FieldSpec::new("y", Int, Necessary),
    FieldSpec::new("rate", Float, Necessary),
];

/// Fields of a BGA header.
pub const BGA_HEADER: &[FieldSpec] = &[
    FieldSpec::new("id", Int, Necessary),
    FieldSpec::new("name", Str, Necessary),
];

/// Fields of a BGA event.
pub const BGA_EVENT: &[FieldSpec] = &[
    FieldSpec::new("y", Int, Necessary),
    FieldSpec::new("id", Int, Necessary),
];

/// Fields of the BGA block.
pub const BGA: &[FieldSpec] = &[
    FieldSpec::new("bga_header", Array(BGA_HEADER), Unnecessary),
    FieldSpec::new("bga_events", Array(BGA_EVENT), Unnecessary),
    FieldSpec::new("layer_events", Array(BGA_EVENT), Unnecessary),
    FieldSpec::new("poor_events", Array(BGA_EVENT), Unnecessary),
];

/// Fields of the chart information.
pub const INFO: &[FieldSpec] = &[
    FieldSpec::new("title", Str, SemiNecessary),
    FieldSpec::new("subtitle", Str, Unnecessary),
    FieldSpec::new("artist", Str, SemiNecessary),
    FieldSpec::new("subartists", Strings, Unnecessary),
    FieldSpec::new("genre", Str, SemiNecessary),
    FieldSpec::new("mode_hint", Str, SemiNecessary).or(Fallback::Str("beat-7k")),
    FieldSpec::new("chart_name", Str, Unnecessary),
    FieldSpec::new("level", Int, SemiNecessary),
    FieldSpec::new("init_bpm", Float, Necessary),
    FieldSpec::new("judge_rank", Float, SemiNecessary).or(Fallback::Float(100.0)),
    FieldSpec::new("total", Float, SemiNecessary).or(Fallback::Float(100.0)),
    FieldSpec::new("back_image", Str, Unnecessary),
    FieldSpec::new("eyecatch_image", Str, Unnecessary),
    FieldSpec::new("title_image", Str, Unnecessary),
    FieldSpec::new("banner_image", Str, Unnecessary),
    FieldSpec::new("preview_music", Str, Unnecessary),
    FieldSpec::new("resolution", Int, Unnecessary).or(Fallback::Int(240)),
    FieldSpec::new("ln_type", Int, Unnecessary),
];

/// Fields of the root object.
pub const BMSON: &[FieldSpec] = &[
    FieldSpec::new("version", Str, Necessary),
    FieldSpec::new("info", Object(INFO), Necessary),
    FieldSpec::new("lines", Array(BAR_LINE), Unnecessary),
    FieldSpec::new("bpm_events", Array(BPM_EVENT), Unnecessary),
    FieldSpec::new("stop_events", Array(STOP_EVENT), Unnecessary),
    FieldSpec::new("sound_channels", Array(SOUND_CHANNEL), Necessary),
    FieldSpec::new("bga", Object(BGA), Unnecessary),
    FieldSpec::new("scroll_events", Array(SCROLL_EVENT), Unnecessary),
];

/// A decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A string.
    Str(String),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// A lane number.
    Number(f64),
    /// Strings.
    Strings(Vec<String>),
    /// A nested object.
    Object(Record),
    /// Nested objects.
    Array(Vec<Record>),
}

/// Decoded fields of an object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: HashMap<&'static str, Value>,
    absent: Vec<&'static str>,
}

impl Record {
    /// The value of the field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Names of the fields which were absent or had values of wrong types, in table order.
    #[must_use]
    pub fn absent(&self) -> &[&'static str] {
        &self.absent
    }

    /// The string field, or empty.
    #[must_use]
    pub fn str(&self, name: &str) -> String {
        match self.get(name) {
            Some(Value::Str(s)) => s.clone(),
            _ => String::new(),
        }
    }

    /// The integer field, or zero.
    #[must_use]
    pub fn int(&self, name: &str) -> i64 {
        match self.get(name) {
            Some(Value::Int(n)) => *n,
            _ => 0,
        }
    }

    /// The float field, or zero.
    #[must_use]
    pub fn float(&self, name: &str) -> f64 {
        match self.get(name) {
            Some(Value::Float(n)) => *n,
            _ => 0.0,
        }
    }

    /// The boolean field, or `false`.
    #[must_use]
    pub fn bool(&self, name: &str) -> bool {
        matches!(self.get(name), Some(Value::Bool(true)))
    }

    /// The lane number field.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// The strings field, or empty.
    #[must_use]
    pub fn strings(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            Some(Value::Strings(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// The nested object field.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&Self> {
        match self.get(name) {
            Some(Value::Object(record)) => Some(record),
            _ => None,
        }
    }

    /// The nested objects field, or empty.
    #[must_use]
    pub fn array(&self, name: &str) -> &[Self] {
        match self.get(name) {
            Some(Value::Array(records)) => records,
            _ => &[],
        }
    }
}

impl Record {
    fn defaults(table: &'static [FieldSpec]) -> Self {
        let mut record = Self::default();
        for spec in table {
            record.absent.push(spec.name);
            if let Some(value) = spec.fallback.value(spec.kind) {
                record.values.insert(spec.name, value);
            }
        }
        record
    }
}

impl Fallback {
    fn value(self, kind: Kind) -> Option<Value> {
        match (self, kind) {
            (Self::Int(n), _) => Some(Value::Int(n)),
            (Self::Float(n), _) => Some(Value::Float(n)),
            (Self::Str(s), _) => Some(Value::Str(s.to_string())),
            (Self::Zero, Kind::Object(table)) => Some(Value::Object(Record::defaults(table))),
            (Self::Zero, _) => None,
        }
    }
}

#[derive(Default)]
struct Decoder {
    unknown: Vec<Log>,
    mismatched: Vec<Log>,
    missing: Vec<Log>,
}

impl Decoder {
    fn object(
        &mut self,
        members: &[(String, Json)],
        table: &'static [FieldSpec],
        location: &str,
    ) -> Record {
        let mut record = Record::default();
        let mut seen = Vec::new();
        for (i, (key, json)) in members.iter().enumerate() {
            let lower = key.to_lowercase();
            if members
                .iter()
                .skip(i + 1)
                .any(|(later, _)| later.to_lowercase() == lower)
            {
                continue;
            }
            let Some(spec) = table.iter().find(|spec| spec.name == lower) else {
                let shown = match json {
                    Json::Str(s) => format!("\"{s}\""),
                    other => other.to_loose_string(),
                };
                self.unknown.push(Log::warning(
                    format!("Invalid field name: {{\"{key}\": {shown}}} in {location}"),
                    format!("無効なフィールド名です: {{\"{key}\": {shown}}} in {location}"),
                ));
                continue;
            };
            seen.push(spec.name);
            if let Some(value) = self.value(json, spec.kind, &format!("{location}.{}", spec.name)) {
                record.values.insert(spec.name, value);
            }
        }
        for spec in table {
            if record.values.contains_key(spec.name) {
                continue;
            }
            record.absent.push(spec.name);
            if !seen.contains(&spec.name) {
                let path = format!("{location}.{}", spec.name);
                match spec.necessity {
                    Necessary => self.missing.push(Log::error(
                        format!("Missing required field: {path}"),
                        format!("必須フィールドがありません: {path}"),
                    )),
                    SemiNecessary => self.missing.push(Log::warning(
                        format!("Missing field: {path}"),
                        format!("フィールドがありません: {path}"),
                    )),
                    Unnecessary => {}
                }
            }
            if let Some(value) = spec.fallback.value(spec.kind) {
                record.values.insert(spec.name, value);
            }
        }
        record
    }

    fn mismatch(&mut self, path: &str, json: &Json) {
        let shown = json.to_loose_string();
        self.mismatched.push(Log::error(
            format!("{path} has invalid value: {shown}"),
            format!("{path}が無効な値です: {shown}"),
        ));
    }

    fn value(&mut self, json: &Json, kind: Kind, path: &str) -> Option<Value> {
        let value = match (kind, json) {
            (Str, Json::Str(s)) => Value::Str(s.clone()),
            (Int, Json::Number(n)) => {
                if n.fract() != 0.0 {
                    self.mismatch(path, json);
                }
                Value::Int(*n as i64)
            }
            (Float, Json::Number(n)) => Value::Float(*n),
            (Bool, Json::Bool(b)) => Value::Bool(*b),
            (Number, Json::Number(n)) => Value::Number(*n),
            (Number, Json::Null) => return None,
            (Strings, Json::Array(items)) => Value::Strings(
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| match item {
                        Json::Str(s) => Some(s.clone()),
                        other => {
                            self.mismatch(&format!("{path}[{i}]"), other);
                            None
                        }
                    })
                    .collect(),
            ),
            (Object(table), Json::Object(members)) => Value::Object(self.object(members, table, path)),
            (Array(table), Json::Array(items)) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let path = format!("{path}[{i}]");
                        match item {
                            Json::Object(members) => self.object(members, table, &path),
                            other => {
                                self.mismatch(&path, other);
                                Record::default()
                            }
                        }
                    })
                    .collect(),
            ),
            _ => {
                self.mismatch(path, json);
                return None;
            }
        };
        Some(value)
    }
}

/// Decodes the members of the root object along [`BMSON`].
///
/// Logs are returned in this order: unknown keys, values of wrong types, and missing fields. A key repeated in an object is decoded from its last occurrence only.
#[must_use]
pub fn decode(members: &[(String, Json)]) -> (Record, Vec<Log>) {
    let mut decoder = Decoder::default();
    let record = decoder.object(members, BMSON, "root");
    let mut logs = decoder.unknown;
    logs.append(&mut decoder.mismatched);
    logs.append(&mut decoder.missing);
    (record, logs)
}

const MAX_SHOWN_VALUE_LEN: usize = 100;

fn shorten(text: String) -> String {
    let len = text.chars().count();
    if len <= MAX_SHOWN_VALUE_LEN {
        return text;
    }
    let head: String = text.chars().take(96).collect();
    let tail: String = text.chars().skip(len - 4).collect();
    format!("{head} ... {tail}")
}

fn walk_duplicates(json: &Json, path: &str, logs: &mut Vec<Log>) {
    match json {
        Json::Object(members) => {
            let mut keys: Vec<(&str, Vec<&Json>)> = Vec::new();
            for (key, value) in members {
                match keys.iter().position(|(k, _)| *k == key.as_str()) {
                    Some(i) => {
                        if let Some((_, values)) = keys.get_mut(i) {
                            values.push(value);
                        }
                    }
                    None => keys.push((key, vec![value])),
                }
            }
            for (key, values) in keys.iter().filter(|(_, values)| values.len() >= 2) {
                let field = child_path(path, key);
                let count = values.len();
                logs.push(
                    Log::warning(
                        format!("Duplicate field: {field} * {count}"),
                        format!("フィールドが重複しています: {field} * {count}"),
                    )
                    .with_detail(values.iter().map(|value| {
                        shorten(match value {
                            Json::Str(s) => s.clone(),
                            other => other.to_compact(),
                        })
                    })),
                );
            }
            for (key, value) in members {
                walk_duplicates(value, &child_path(path, key), logs);
            }
        }
        Json::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                walk_duplicates(item, &format!("{path}[{i}]"), logs);
            }
        }
        _ => {}
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Reports keys repeated in an object, walking objects before their children.
#[must_use]
pub fn duplicate_fields(root: &Json) -> Vec<Log> {
    let mut logs = Vec::new();
    walk_duplicates(root, "", &mut logs);
    logs
}
