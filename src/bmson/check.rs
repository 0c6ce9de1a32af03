//! Semantic checks over a scanned [`BmsonFile`].

use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;

use super::{BarLine, BgaEvent, BgaHeader, BmsonFile, BmsonInfo, BpmEvent, Note, ScrollEvent, StopEvent};
use crate::{
    bms::check::percentage,
    command::{AUDIO_EXTS, BMSON_INFO_FIELDS, CommandType, Necessity},
    log::Log,
    path::{extension, has_ext},
    total::{TotalJudge, default_total, judge_total},
};

/// Runs all per file checks and appends their logs to the file.
pub fn check_bmson_file(file: &mut BmsonFile) {
    let mut logs = check_info(file);
    logs.extend(check_title_texts(&file.bmson.info));
    logs.extend(check_sound_channel_names(file));
    logs.extend(check_empty_sound_channels(file));
    logs.extend(check_non_wav_sound_channels(file));
    logs.extend(check_total_notes_is_zero(file));
    logs.extend(check_notes_in_0th_measure(file));
    logs.extend(check_placed_undefined_bga_ids(file));
    logs.extend(check_defined_unplaced_bga_headers(file));
    logs.extend(check_duplicate_bga_header_ids(file));
    logs.extend(check_duplicate_y(file));
    logs.extend(check_notes_in_ln(file));
    logs.extend(check_without_keysound(file, None));
    file.logs.extend(logs);
}

fn info_value(info: &BmsonInfo, name: &str) -> String {
    match name {
        "title" => info.title.clone(),
        "subtitle" => info.subtitle.clone(),
        "artist" => info.artist.clone(),
        "subartists" => info.subartists.join(" "),
        "genre" => info.genre.clone(),
        "mode_hint" => info.mode_hint.clone(),
        "chart_name" => info.chart_name.clone(),
        "level" => info.level.to_string(),
        "init_bpm" => info.init_bpm.to_string(),
        "judge_rank" => info.judge_rank.to_string(),
        "total" => info.total.to_string(),
        "back_image" => info.back_image.clone(),
        "eyecatch_image" => info.eyecatch_image.clone(),
        "title_image" => info.title_image.clone(),
        "banner_image" => info.banner_image.clone(),
        "preview_music" => info.preview_music.clone(),
        "resolution" => info.resolution.to_string(),
        "ln_type" => info.ln_type.to_string(),
        _ => String::new(),
    }
}

/// Checks the `info` fields against their rules, then the judge rank and the total.
///
/// Fields which were absent are skipped, as they are already reported by scanning.
#[must_use]
pub fn check_info(file: &BmsonFile) -> Vec<Log> {
    let info = &file.bmson.info;
    let mut logs = Vec::new();
    for rule in BMSON_INFO_FIELDS.iter() {
        let name = rule.name;
        if !file.has_info_field(name) {
            continue;
        }
        let value = info_value(info, name);
        let is_text = matches!(rule.command_type, CommandType::String | CommandType::Path)
            && name != "subartists";
        if is_text && value.is_empty() {
            if rule.necessity != Necessity::Unnecessary {
                logs.push(Log::warning(
                    format!("info.{name} value is empty"),
                    format!("info.{name}の値が空です"),
                ));
            }
        } else if !rule.is_valid(&value) {
            logs.push(Log::error(
                format!("info.{name} has invalid value: {value}"),
                format!("info.{name}が無効な値です: {value}"),
            ));
        } else if name == "judge_rank" {
            if info.judge_rank >= 125.0 {
                logs.push(Log::notice(
                    format!("info.judge_rank is very high: {value}"),
                    format!("info.judge_rankがかなり高いです: {value}"),
                ));
            } else if info.judge_rank <= 50.0 {
                logs.push(Log::notice(
                    format!("info.judge_rank is very low: {value}"),
                    format!("info.judge_rankがかなり低いです: {value}"),
                ));
            }
        } else if name == "total" {
            logs.extend(total_log(file, &value));
        }
    }
    logs
}

fn total_log(file: &BmsonFile, defined: &str) -> Option<Log> {
    let notes = file.total_notes;
    let real = default_total(notes, file.keymode) * file.bmson.info.total / 100.0;
    if real < 100.0 {
        return Some(Log::warning(
            format!("Real total value is under 100: Real:{real:.2} Defined:{defined}"),
            format!("実際のTotal値が100未満です: 実際:{real:.2} 定義:{defined}"),
        ));
    }
    if notes == 0 {
        return None;
    }
    match judge_total(real, notes, file.keymode) {
        TotalJudge::High => Some(Log::notice(
            format!("info.total is very high(TotalNotes={notes}): Real:{real:.2} Defined:{defined}"),
            format!("info.totalがかなり高いです(トータルノーツ={notes}): 実際:{real:.2} 定義:{defined}"),
        )),
        TotalJudge::Low => Some(Log::notice(
            format!("info.total is very low(TotalNotes={notes}): Real:{real:.2} Defined:{defined}"),
            format!("info.totalがかなり低いです(トータルノーツ={notes}): 実際:{real:.2} 定義:{defined}"),
        )),
        TotalJudge::Normal => None,
    }
}

/// Finds pairs of `title`, `subtitle` and `chart_name` where the former ends with the latter.
#[must_use]
pub fn check_title_texts(info: &BmsonInfo) -> Vec<Log> {
    let titles = [
        ("title", &info.title),
        ("subtitle", &info.subtitle),
        ("chart_name", &info.chart_name),
    ];
    titles
        .iter()
        .tuple_combinations()
        .filter(|((_, a), (_, b))| {
            !a.is_empty() && !b.is_empty() && a.to_lowercase().ends_with(&b.to_lowercase())
        })
        .map(|((field_a, a), (field_b, b))| {
            Log::warning(
                format!("info.{field_a} and info.{field_b} contain the same string: {a}, {b}"),
                format!("info.{field_a}とinfo.{field_b}が同じ文字列を含んでいます: {a}, {b}"),
            )
        })
        .collect()
}

/// Finds sound channels whose name is not an audio file.
#[must_use]
pub fn check_sound_channel_names(file: &BmsonFile) -> Vec<Log> {
    file.bmson
        .sound_channels
        .iter()
        .enumerate()
        .filter(|(_, channel)| !has_ext(&channel.name, AUDIO_EXTS))
        .map(|(i, channel)| {
            Log::warning(
                format!("sound_channels[{i}].name is invalid value: {}", channel.name),
                format!("sound_channels[{i}].nameが無効な値です: {}", channel.name),
            )
        })
        .collect()
}

/// Finds sound channels without notes.
#[must_use]
pub fn check_empty_sound_channels(file: &BmsonFile) -> Vec<Log> {
    file.bmson
        .sound_channels
        .iter()
        .enumerate()
        .filter(|(_, channel)| channel.notes.is_empty())
        .map(|(i, channel)| {
            Log::warning(
                format!("sound_channels[{i}].notes is empty: name:{}", channel.name),
                format!("sound_channels[{i}].notesが空です: name:{}", channel.name),
            )
        })
        .collect()
}

/// Notices sound channels whose file is not `.wav`.
#[must_use]
pub fn check_non_wav_sound_channels(file: &BmsonFile) -> Option<Log> {
    let non_wavs: Vec<&str> = file
        .bmson
        .sound_channels
        .iter()
        .map(|channel| channel.name.as_str())
        .filter(|name| !extension(name).eq_ignore_ascii_case(".wav"))
        .collect();
    let first = non_wavs.first()?;
    let count = non_wavs.len();
    Some(Log::notice(
        format!("sound_channels has filenames non-.wav extension(*{count}): {first} etc..."),
        format!("sound_channelsに拡張子.wavでないファイル名があります(*{count}): {first} etc..."),
    ))
}

/// Reports a chart without notes.
#[must_use]
pub fn check_total_notes_is_zero(file: &BmsonFile) -> Option<Log> {
    (file.total_notes == 0).then(|| Log::error("TotalNotes is 0", "トータルノーツ数が0です"))
}

/// A note with where it is written.
#[derive(Debug, Clone, Copy)]
struct SoundNote<'a> {
    channel_index: usize,
    name: &'a str,
    note_index: usize,
    note: Note,
}

impl SoundNote<'_> {
    fn describe(&self) -> String {
        format!(
            "sound_channels[{}]({})[{}] {{x:{}, y:{}}}",
            self.channel_index, self.name, self.note_index, self.note.x, self.note.y
        )
    }
}

fn sound_notes(file: &BmsonFile) -> impl Iterator<Item = SoundNote<'_>> {
    file.bmson
        .sound_channels
        .iter()
        .enumerate()
        .flat_map(|(channel_index, channel)| {
            channel
                .notes
                .iter()
                .enumerate()
                .map(move |(note_index, note)| SoundNote {
                    channel_index,
                    name: &channel.name,
                    note_index,
                    note: *note,
                })
        })
}

/// Finds notes before the first bar line.
#[must_use]
pub fn check_notes_in_0th_measure(file: &BmsonFile) -> Option<Log> {
    let first_bar_y = file
        .bmson
        .lines
        .iter()
        .map(|line| line.y)
        .find(|&y| y > 0)
        .unwrap_or(0);
    let notes: Vec<String> = sound_notes(file)
        .filter(|sound| sound.note.x.is_positive() && sound.note.y < first_bar_y)
        .map(|sound| sound.describe())
        .collect();
    (!notes.is_empty()).then(|| {
        Log::warning("Note exists in 0th measure", "0小節目にノーツが配置されています")
            .with_list(notes)
    })
}

fn bga_event_lists(file: &BmsonFile) -> [(&'static str, &[BgaEvent]); 3] {
    let bga = &file.bmson.bga;
    [
        ("bga_events", &bga.bga_events),
        ("layer_events", &bga.layer_events),
        ("poor_events", &bga.poor_events),
    ]
}

/// Finds BGA events referring to undefined headers, per event list.
#[must_use]
pub fn check_placed_undefined_bga_ids(file: &BmsonFile) -> Vec<Log> {
    let defined: HashSet<i64> = file.bmson.bga.bga_header.iter().map(|header| header.id).collect();
    bga_event_lists(file)
        .into_iter()
        .filter_map(|(name, events)| {
            let ids: Vec<String> = events
                .iter()
                .filter(|event| !defined.contains(&event.id))
                .map(|event| event.id.to_string())
                .collect();
            (!ids.is_empty()).then(|| {
                Log::warning(
                    format!("Placed {name}.id is undefined"),
                    format!("配置されている{name}.idが未定義です"),
                )
                .with_list(ids)
            })
        })
        .collect()
}

fn describe_header(header: &BgaHeader) -> String {
    format!("{{id:{} name:{}}}", header.id, header.name)
}

/// Finds BGA headers which no event refers to.
#[must_use]
pub fn check_defined_unplaced_bga_headers(file: &BmsonFile) -> Option<Log> {
    let placed: HashSet<i64> = bga_event_lists(file)
        .iter()
        .flat_map(|(_, events)| events.iter().map(|event| event.id))
        .collect();
    let unplaced: Vec<String> = file
        .bmson
        .bga
        .bga_header
        .iter()
        .enumerate()
        .filter(|(_, header)| !placed.contains(&header.id))
        .map(|(i, header)| format!("[{i}] {}", describe_header(header)))
        .collect();
    (!unplaced.is_empty()).then(|| {
        Log::warning(
            "Defined bga_header is not placed",
            "定義されているbga_headerが未配置です",
        )
        .with_list(unplaced)
    })
}

/// Finds BGA header ids defined more than once, in id order.
#[must_use]
pub fn check_duplicate_bga_header_ids(file: &BmsonFile) -> Vec<Log> {
    let mut by_id: BTreeMap<i64, Vec<(usize, &BgaHeader)>> = BTreeMap::new();
    for (i, header) in file.bmson.bga.bga_header.iter().enumerate() {
        by_id.entry(header.id).or_default().push((i, header));
    }
    by_id
        .into_iter()
        .filter(|(_, headers)| headers.len() >= 2)
        .map(|(id, headers)| {
            let count = headers.len();
            Log::warning(
                format!("bga_header has duplicate id: {id} * {count}"),
                format!("bga_headerでidが重複しています: {id} * {count}"),
            )
            .with_detail(
                headers
                    .into_iter()
                    .map(|(i, header)| format!("bga_header[{i}] {}", describe_header(header))),
            )
        })
        .collect()
}

/// An event placed at a pulse.
trait Placed {
    fn y(&self) -> i64;
    fn describe(&self) -> String;
}

impl Placed for BarLine {
    fn y(&self) -> i64 {
        self.y
    }
    fn describe(&self) -> String {
        format!("{{y:{}}}", self.y)
    }
}

impl Placed for Note {
    fn y(&self) -> i64 {
        self.y
    }
    fn describe(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl Placed for BpmEvent {
    fn y(&self) -> i64 {
        self.y
    }
    fn describe(&self) -> String {
        format!("{{y:{} bpm:{}}}", self.y, super::format_float(self.bpm)).to_lowercase()
    }
}

impl Placed for StopEvent {
    fn y(&self) -> i64 {
        self.y
    }
    fn describe(&self) -> String {
        format!("{{y:{} duration:{}}}", self.y, self.duration)
    }
}

impl Placed for ScrollEvent {
    fn y(&self) -> i64 {
        self.y
    }
    fn describe(&self) -> String {
        format!("{{y:{} rate:{}}}", self.y, super::format_float(self.rate)).to_lowercase()
    }
}

impl Placed for BgaEvent {
    fn y(&self) -> i64 {
        self.y
    }
    fn describe(&self) -> String {
        format!("{{y:{} id:{}}}", self.y, self.id)
    }
}

fn duplicate_y<T: Placed>(field: &str, events: &[T]) -> Vec<Log> {
    let mut indexed: Vec<(usize, &T)> = events.iter().enumerate().collect();
    indexed.sort_by_key(|(_, event)| event.y());
    indexed
        .chunk_by(|(_, a), (_, b)| a.y() == b.y())
        .filter(|same| same.len() >= 2)
        .filter_map(|same| {
            let (_, first) = same.first()?;
            let (y, count) = (first.y(), same.len());
            Some(
                Log::warning(
                    format!("{field} has duplicate y values: {y} * {count}"),
                    format!("{field}でy値が重複しています: {y} * {count}"),
                )
                .with_detail(
                    same.iter()
                        .map(|(i, event)| format!("{field}[{i}] {}", event.describe())),
                ),
            )
        })
        .collect()
}

/// Finds events sharing a pulse, per event list.
#[must_use]
pub fn check_duplicate_y(file: &BmsonFile) -> Vec<Log> {
    let bmson = &file.bmson;
    let mut logs = duplicate_y("lines", &bmson.lines);
    for (i, channel) in bmson.sound_channels.iter().enumerate() {
        logs.extend(duplicate_y(
            &format!("sound_channels[{i}]({})", channel.name),
            &channel.notes,
        ));
    }
    logs.extend(duplicate_y("bpm_events", &bmson.bpm_events));
    logs.extend(duplicate_y("stop_events", &bmson.stop_events));
    logs.extend(duplicate_y("scroll_events", &bmson.scroll_events));
    for (name, events) in bga_event_lists(file) {
        logs.extend(duplicate_y(name, events));
    }
    logs
}

/// Finds notes placed inside long notes of the same lane.
///
/// The start of a long note is excluded, so that layered notes are allowed, and so is its end if the note there is marked `up`.
#[must_use]
pub fn check_notes_in_ln(file: &BmsonFile) -> Vec<Log> {
    let mut lanes: BTreeMap<i64, Vec<SoundNote<'_>>> = BTreeMap::new();
    for sound in sound_notes(file) {
        if let Some(lane) = sound.note.x.lane() {
            lanes.entry(lane).or_default().push(sound);
        }
    }

    let mut logs = Vec::new();
    for notes in lanes.values_mut() {
        notes.sort_by_key(|sound| sound.note.y);
        let mut ongoing: Option<SoundNote<'_>> = None;
        for sound in notes.iter() {
            if let Some(ln) = ongoing {
                let (y, end) = (sound.note.y, ln.note.y + ln.note.l);
                if ln.note.y < y && y <= end {
                    if !(y == end && sound.note.up) {
                        let (kind, kind_ja) = if sound.note.l > 0 {
                            ("Long", "ロング")
                        } else {
                            ("Normal", "通常")
                        };
                        let (note, ln) = (sound.describe(), ln.describe());
                        logs.push(Log::error(
                            format!("{kind} note is in LN: {note} in {ln}"),
                            format!("{kind_ja}ノーツがLNの中に配置されています: {note} in {ln}"),
                        ));
                    }
                } else if end < y {
                    ongoing = None;
                }
            }
            if sound.note.l > 0 {
                ongoing = Some(*sound);
            }
        }
    }
    logs
}

/// Reports moments and notes whose sound channel is not an audio file.
///
/// With `wav_exists`, a sound channel whose file does not exist is also regarded as silent, and nothing is reported unless such a channel is placed.
#[must_use]
pub fn check_without_keysound(
    file: &BmsonFile,
    wav_exists: Option<&dyn Fn(&str) -> bool>,
) -> Vec<Log> {
    let mut missing_file_is_placed = false;
    let mut is_silent = |name: &str| {
        if !has_ext(name, AUDIO_EXTS) {
            return true;
        }
        match wav_exists {
            Some(exists) if !exists(name) => {
                missing_file_is_placed = true;
                true
            }
            _ => false,
        }
    };

    let mut notes: Vec<SoundNote<'_>> = sound_notes(file)
        .filter(|sound| sound.note.x.lane().is_some())
        .collect();
    notes.sort_by_key(|sound| sound.note.y);

    let (mut moment_count, mut silent_moments, mut silent_notes) = (0, 0, 0);
    for moment in notes.chunk_by(|a, b| a.note.y == b.note.y) {
        moment_count += 1;
        let mut is_silent_moment = true;
        for sound in moment {
            if is_silent(sound.name) {
                silent_notes += 1;
            } else {
                is_silent_moment = false;
            }
        }
        if is_silent_moment {
            silent_moments += 1;
        }
    }
    if wav_exists.is_some() && !missing_file_is_placed {
        return Vec::new();
    }

    let (suffix, suffix_ja) = if wav_exists.is_some() {
        (" (or audio file)", "(または音声ファイル)")
    } else {
        ("", "")
    };
    let mut logs = Vec::new();
    if silent_moments > 0 {
        let text = percentage(silent_moments, moment_count);
        logs.push(Log::warning(
            format!("Moments without keysound{suffix} exist: {text}"),
            format!("キー音{suffix_ja}の無い瞬間があります: {text}"),
        ));
    }
    if silent_notes > 0 {
        let text = percentage(silent_notes, notes.len());
        logs.push(Log::notice(
            format!("Notes without keysound{suffix} exist: {text}"),
            format!("キー音{suffix_ja}の無いノーツがあります: {text}"),
        ));
    }
    logs
}
