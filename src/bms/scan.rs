//! Scanning BMS bytes into a [`BmsFile`].

use std::{ops::Range, sync::LazyLock};

use encoding_rs::SHIFT_JIS;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use super::{
    BmsFile, DuplicateDefinition, IndexedDef, InvalidLine, MeasureLength, ScanError,
    channel,
    fraction::Fraction,
    obj::{BmsObj, ObjType, sort_by_time},
};
use crate::{
    command::{HEADER_COMMANDS, INDEXED_COMMANDS},
    env::{CharsetDetector, UTF8_BOM},
    log::Log,
    path::{extension, has_multibyte},
};

/// Longest acceptable line in bytes.
pub const MAX_LINE_LEN: usize = 1_000_000;

static INDEXED_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    let names = INDEXED_COMMANDS
        .iter()
        .map(|rule| rule.name)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"^#({names})([0-9a-z]{{2}}) .+")).expect("valid regex")
});
static DATA_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9]{3})([0-9a-z]{2}):.+").expect("valid regex"));
static MEASURE_LENGTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("valid regex"));
static OBJECTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-zA-Z]+$").expect("valid regex"));

const CONTROL_FLOW_COMMANDS: &[&str] = &["random", "if", "endif"];

/// A classified line.
#[derive(Debug, Clone, PartialEq)]
enum Line<'a> {
    Header {
        name: &'static str,
        data: &'a str,
    },
    Indexed {
        command_name: String,
        index: String,
        data: &'a str,
    },
    MeasureLength {
        measure: u32,
        length: &'a str,
    },
    Objects {
        obj_type: ObjType,
        channel: String,
        measure: u32,
        data: &'a str,
    },
    ControlFlow,
}

type Matcher = for<'a> fn(&'a str, &str) -> Option<Line<'a>>;

/// Matchers tried in order, the first match wins. Lines matching nothing are invalid.
const MATCHERS: &[Matcher] = &[header_command, indexed_command, data_row, control_flow];

fn is_command(lower: &str, name: &str) -> bool {
    lower
        .strip_prefix('#')
        .and_then(|rest| rest.strip_prefix(name))
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
}

fn header_command<'a>(line: &'a str, lower: &str) -> Option<Line<'a>> {
    let rule = HEADER_COMMANDS
        .iter()
        .find(|rule| is_command(lower, rule.name))?;
    let data = line.get(rule.name.len() + 1..).unwrap_or("").trim();
    Some(Line::Header {
        name: rule.name,
        data,
    })
}

fn indexed_command<'a>(line: &'a str, lower: &str) -> Option<Line<'a>> {
    let captures = INDEXED_COMMAND.captures(lower)?;
    let command_name = captures.get(1)?.as_str().to_string();
    let index = captures.get(2)?.as_str().to_string();
    let data = line.get(command_name.len() + 3..).unwrap_or("").trim();
    Some(Line::Indexed {
        command_name,
        index,
        data,
    })
}

fn data_row<'a>(line: &'a str, lower: &str) -> Option<Line<'a>> {
    let captures = DATA_ROW.captures(lower)?;
    let measure = captures.get(1)?.as_str().parse().ok()?;
    let channel = captures.get(2)?.as_str();
    let data = line.get(7..)?.trim();
    if channel == channel::MEASURE_LENGTH {
        return MEASURE_LENGTH
            .is_match(data)
            .then_some(Line::MeasureLength {
                measure,
                length: data,
            });
    }
    let obj_type = channel::obj_type(channel)?;
    (data.len() % 2 == 0 && OBJECTS.is_match(data)).then(|| Line::Objects {
        obj_type,
        channel: channel.to_string(),
        measure,
        data,
    })
}

fn control_flow<'a>(_line: &'a str, lower: &str) -> Option<Line<'a>> {
    CONTROL_FLOW_COMMANDS
        .iter()
        .any(|command| is_command(lower, command))
        .then_some(Line::ControlFlow)
}

fn classify<'a>(line: &'a str) -> Option<Line<'a>> {
    let lower = line.to_ascii_lowercase();
    MATCHERS.iter().find_map(|matcher| matcher(line, &lower))
}

/// Decodes `bytes` as UTF-8 if `is_utf8`, otherwise as Shift_JIS. A leading byte order mark is removed.
fn decode(bytes: &[u8], is_utf8: bool) -> String {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if is_utf8 {
        String::from_utf8_lossy(body).into_owned()
    } else {
        let (text, _) = SHIFT_JIS.decode_without_bom_handling(body);
        text.into_owned()
    }
}

/// Scans bytes of a BMS file.
///
/// Findings of the syntax level are recorded in [`BmsFile::logs`] in this order: duplicated definitions, invalid lines, and the charset.
///
/// # Errors
///
/// Returns [`ScanError::LineTooLong`] if a line is longer than [`MAX_LINE_LEN`] bytes.
pub fn scan_bms(
    path: impl Into<String>,
    bytes: &[u8],
    detector: &impl CharsetDetector,
) -> Result<BmsFile, ScanError> {
    let mut file = BmsFile::new(path);
    if let Some((line_number, line)) = bytes
        .split(|&b| b == b'\n')
        .enumerate()
        .find(|(_, line)| line.len() > MAX_LINE_LEN)
    {
        return Err(ScanError::LineTooLong {
            line_number,
            len: line.len(),
        });
    }

    file.sha256 = hex::encode(Sha256::digest(bytes));
    file.is_utf8 = bytes.starts_with(UTF8_BOM) || detector.is_utf8(bytes);
    file.text = decode(bytes, file.is_utf8);

    let text = std::mem::take(&mut file.text);
    let mut has_multibyte_line = false;
    let mut offset = 0;
    for (line_number, raw) in text.split('\n').enumerate() {
        let start = offset + (raw.len() - raw.trim_start().len());
        offset += raw.len() + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let span = start..start + line.len();
        has_multibyte_line |= has_multibyte(line);
        if line.starts_with(['*', '%']) {
            continue;
        }
        match classify(line) {
            Some(classified) => file.apply(classified, span),
            None => {
                trace!(line_number, line, "invalid line");
                file.invalid_lines.push(InvalidLine {
                    line_number,
                    text: line.to_string(),
                    span,
                });
            }
        }
    }
    file.text = text;

    file.sort_objs();
    file.mark_ln_ends();
    file.keymode = file.detect_keymode();
    file.total_notes = file.count_total_notes();

    let duplicate_logs: Vec<Log> = file.duplicates.iter().map(DuplicateDefinition::to_log).collect();
    let invalid_logs: Vec<Log> = file.invalid_lines.iter().map(InvalidLine::to_log).collect();
    file.logs.extend(duplicate_logs);
    file.logs.extend(invalid_logs);
    if file.is_utf8 {
        file.logs.push(if has_multibyte_line {
            Log::error(
                "Bmsfile charset is UTF-8, not Shift-JIS, and contains multibyte characters",
                "BMSファイルの文字コードがShift-JISではなくUTF-8です。またマルチバイト文字を含んでいます",
            )
        } else {
            Log::notice(
                "Bmsfile charset is UTF-8, not Shift-JIS",
                "BMSファイルの文字コードがShift-JISではなくUTF-8です",
            )
        });
    }

    debug!(
        path = %file.path,
        keymode = file.keymode,
        total_notes = file.total_notes,
        "scanned bms file"
    );
    Ok(file)
}

impl BmsFile {
    fn apply(&mut self, line: Line<'_>, span: Range<usize>) {
        match line {
            Line::Header { name, data } => {
                if let Some(old) = self.header.get(name) {
                    self.duplicates.push(DuplicateDefinition {
                        command: name.to_string(),
                        old_value: old.clone(),
                        new_value: data.to_string(),
                        span,
                    });
                    if data.is_empty() {
                        return;
                    }
                }
                self.header.insert(name.to_string(), data.to_string());
            }
            Line::Indexed {
                command_name,
                index,
                data,
            } => {
                let defs = match command_name.as_str() {
                    "wav" => &mut self.wav_defs,
                    "bmp" => &mut self.bmp_defs,
                    "bpm" => &mut self.bpm_defs,
                    "stop" => &mut self.stop_defs,
                    _ => &mut self.scroll_defs,
                };
                if let Some(def) = defs.iter_mut().find(|def| def.index == index) {
                    self.duplicates.push(DuplicateDefinition {
                        command: format!("{command_name}{index}"),
                        old_value: def.value.clone(),
                        new_value: data.to_string(),
                        span,
                    });
                    if !data.is_empty() {
                        def.value = data.to_string();
                    }
                } else {
                    defs.push(IndexedDef {
                        command_name,
                        index,
                        value: data.to_string(),
                    });
                }
            }
            Line::MeasureLength { measure, length } => self.measure_lengths.push(MeasureLength {
                measure,
                length: length.to_string(),
            }),
            Line::Objects {
                obj_type,
                channel,
                measure,
                data,
            } => {
                let slots = data.len() / 2;
                for slot in 0..slots {
                    let value = data
                        .get(slot * 2..slot * 2 + 2)
                        .and_then(|pair| u32::from_str_radix(pair, 36).ok())
                        .unwrap_or(0);
                    if value == 0 {
                        continue;
                    }
                    let obj = BmsObj {
                        obj_type,
                        channel: channel.clone(),
                        measure,
                        position: Fraction::new(slot as i64, slots as i64),
                        value,
                        is_ln_end: false,
                    };
                    self.objs_mut(obj_type).push(obj);
                }
            }
            Line::ControlFlow => {}
        }
    }

    fn objs_mut(&mut self, obj_type: ObjType) -> &mut Vec<BmsObj> {
        match obj_type {
            ObjType::Wav => &mut self.wav_objs,
            ObjType::Bmp => &mut self.bmp_objs,
            ObjType::Mine => &mut self.mine_objs,
            ObjType::Bpm => &mut self.bpm_objs,
            ObjType::ExtendedBpm => &mut self.extended_bpm_objs,
            ObjType::Stop => &mut self.stop_objs,
            ObjType::Scroll => &mut self.scroll_objs,
        }
    }

    fn sort_objs(&mut self) {
        for obj_type in [
            ObjType::Wav,
            ObjType::Bmp,
            ObjType::Mine,
            ObjType::Bpm,
            ObjType::ExtendedBpm,
            ObjType::Stop,
            ObjType::Scroll,
        ] {
            let objs = self.objs_mut(obj_type);
            objs.sort_by_key(|obj| obj.value);
            sort_by_time(objs);
        }
        self.measure_lengths.sort_by_key(|mlen| mlen.measure);
    }

    /// Marks the objects closing long notes, by `#LNOBJ` or by the second object on a long note channel.
    fn mark_ln_ends(&mut self) {
        let lnobj = self.lnobj();
        let mut pending = std::collections::HashSet::new();
        for obj in &mut self.wav_objs {
            if obj.channel == channel::BGM {
                continue;
            }
            if obj.value36() == lnobj {
                obj.is_ln_end = true;
                if let Some(ln) = channel::paired_ln(&obj.channel) {
                    pending.remove(&ln);
                }
            } else if channel::is_ln(&obj.channel) {
                if pending.remove(&obj.channel) {
                    obj.is_ln_end = true;
                } else {
                    pending.insert(obj.channel.clone());
                }
            }
        }
    }

    fn detect_keymode(&self) -> u32 {
        let (mut has_7k, mut has_10k, mut has_14k) = (false, false, false);
        for obj in &self.wav_objs {
            match channel::number(&obj.channel) {
                18..=19 | 38..=39 => has_7k = true,
                21..=26 | 41..=46 => has_10k = true,
                28..=29 | 48..=49 => has_14k = true,
                _ => {}
            }
        }
        if extension(&self.path).eq_ignore_ascii_case(".pms") {
            9
        } else if has_10k || has_14k {
            if has_7k || has_14k { 14 } else { 10 }
        } else if has_7k {
            7
        } else {
            5
        }
    }

    fn count_total_notes(&self) -> usize {
        let lnobj = self.lnobj();
        let (mut notes, mut ln_notes) = (0, 0);
        for obj in self.wav_objs.iter().filter(|obj| channel::is_note(&obj.channel)) {
            if channel::is_ln(&obj.channel) || obj.value36() == lnobj {
                ln_notes += 1;
            } else {
                notes += 1;
            }
        }
        let lnmode: i64 = self
            .header("lnmode")
            .and_then(|mode| mode.parse().ok())
            .unwrap_or(0);
        if lnmode >= 2 {
            notes + ln_notes
        } else {
            notes + ln_notes / 2
        }
    }
}
