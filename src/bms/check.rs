//! Semantic checks over a scanned [`BmsFile`].
//!
//! Each check is a function returning its findings, so they can be run alone. [`check_bms_file`] runs all of them in the display order and appends the results to the logs of the file.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use itertools::Itertools;

use super::{BmsFile, IndexedDef, channel, moments, obj::sort_by_time};
use crate::{
    bms::{BmsObj, ObjType},
    command::{CommandRule, HEADER_COMMANDS, INDEXED_COMMANDS, Necessity},
    log::Log,
    path::extension,
    total::{TotalJudge, judge_total},
};

/// Runs all per file checks and appends their logs to the file.
pub fn check_bms_file(file: &mut BmsFile) {
    let mut logs = check_header_commands(file);
    logs.extend(check_title_and_subtitle(file));
    logs.extend(check_indexed_definitions(file));
    logs.extend(check_total_notes_is_zero(file));
    logs.extend(check_notes_in_0th_measure(file));
    logs.extend(check_placed_and_defined(file));
    logs.extend(check_mine_explosion_sound(file));
    logs.extend(check_wav_duplicates(file));
    logs.extend(check_note_overlaps(file));
    logs.extend(check_ln_containment(file));
    logs.extend(check_bpm_objects(file));
    logs.extend(check_measure_lengths(file));
    logs.extend(check_without_keysound(file, None));
    file.logs.extend(logs);
}

fn missing_log(rule: &CommandRule, name: &str, name_ja: &str) -> Option<Log> {
    let level = match rule.necessity {
        Necessity::Necessary => crate::log::Level::Error,
        Necessity::SemiNecessary => crate::log::Level::Warning,
        Necessity::Unnecessary => return None,
    };
    Some(Log::new(
        level,
        format!("#{name} definition is missing"),
        format!("#{name_ja}"),
    ))
}

/// Checks the header commands against [`HEADER_COMMANDS`]: missing, empty or invalid values, and values worth noticing.
#[must_use]
pub fn check_header_commands(file: &BmsFile) -> Vec<Log> {
    let mut logs = Vec::new();
    for rule in HEADER_COMMANDS.iter() {
        let name = rule.name.to_ascii_uppercase();
        let Some(value) = file.header(rule.name) else {
            logs.extend(missing_log(rule, &name, &format!("{name}定義が見つかりません")));
            continue;
        };
        if value.is_empty() {
            logs.push(Log::warning(
                format!("#{name} value is empty"),
                format!("#{name}の値が空です"),
            ));
        } else if !rule.is_valid(value) {
            logs.push(Log::error(
                format!("#{name} has invalid value: {value}"),
                format!("#{name}が無効な値です: {value}"),
            ));
        } else {
            logs.extend(notable_header_value(file, rule.name, value));
        }
    }
    logs
}

fn notable_header_value(file: &BmsFile, name: &str, value: &str) -> Option<Log> {
    match name {
        "rank" => {
            let rank = match value.parse::<i64>().ok()? {
                0 => "0(VERY HARD)",
                1 => "1(HARD)",
                4 => "4(VERY EASY)",
                _ => return None,
            };
            Some(Log::notice(
                format!("#RANK is {rank}"),
                format!("#RANKが{rank}です"),
            ))
        }
        "total" => {
            let total: f64 = value.parse().ok()?;
            if total < 100.0 {
                return Some(Log::warning(
                    format!("#TOTAL is under 100: {value}"),
                    format!("#TOTALが100未満です: {value}"),
                ));
            }
            let notes = file.total_notes;
            match judge_total(total, notes, file.keymode) {
                TotalJudge::High => Some(Log::notice(
                    format!("#TOTAL is very high(TotalNotes={notes}): {value}"),
                    format!("#TOTALがかなり高いです(トータルノーツ={notes}): {value}"),
                )),
                TotalJudge::Low => Some(Log::notice(
                    format!("#TOTAL is very low(TotalNotes={notes}): {value}"),
                    format!("#TOTALがかなり低いです(トータルノーツ={notes}): {value}"),
                )),
                TotalJudge::Normal => None,
            }
        }
        "difficulty" if value == "0" => Some(Log::warning(
            "#DIFFICULTY is 0(Undefined)",
            "#DIFFICULTYが0(未定義)です",
        )),
        "defexrank" => Some(Log::notice(
            format!("#DEFEXRANK is defined: {value}"),
            format!("#DEFEXRANKが定義されています: {value}"),
        )),
        "lntype" if value == "2" => Some(Log::warning(
            "#LNTYPE 2(MGQ) is deprecated",
            "#LNTYPE 2(MGQ)は非推奨です",
        )),
        _ => None,
    }
}

/// Checks whether the title ends with the subtitle.
#[must_use]
pub fn check_title_and_subtitle(file: &BmsFile) -> Option<Log> {
    let title = file.header("title")?;
    let subtitle = file.header("subtitle")?;
    (!subtitle.is_empty() && title.to_lowercase().ends_with(&subtitle.to_lowercase())).then(|| {
        Log::warning(
            format!("The end of #TITLE contains the same string as #SUBTITLE: {subtitle}"),
            format!("#TITLEの末尾に#SUBTITLEと同じ文字列を含んでいます:{subtitle}"),
        )
    })
}

/// Checks the indexed definitions against [`INDEXED_COMMANDS`].
#[must_use]
pub fn check_indexed_definitions(file: &BmsFile) -> Vec<Log> {
    let all_defs = [
        &file.wav_defs,
        &file.bmp_defs,
        &file.bpm_defs,
        &file.stop_defs,
        &file.scroll_defs,
    ];
    let (mut missing, mut invalid) = (Vec::new(), Vec::new());
    let mut non_wav_exts: Vec<&IndexedDef> = Vec::new();
    for (rule, defs) in INDEXED_COMMANDS.iter().zip(all_defs) {
        if defs.is_empty() {
            let name = rule.name.to_ascii_uppercase();
            missing.extend(missing_log(
                rule,
                &format!("{name}xx"),
                &format!("{name}xxの定義が見つかりません"),
            ));
        }
        for def in defs {
            let command = def.command();
            if !rule.is_valid(&def.value) {
                invalid.push(Log::error(
                    format!("#{command} has invalid value: {}", def.value),
                    format!("#{command}が無効な値です: {}", def.value),
                ));
            } else if def.command_name == "wav" && extension(&def.value).to_lowercase() != ".wav" {
                non_wav_exts.push(def);
            }
        }
    }
    let mut logs = missing;
    logs.append(&mut invalid);
    if let Some(first) = non_wav_exts.first() {
        let detail = format!(
            "(*{}): {} {} etc...",
            non_wav_exts.len(),
            first.command(),
            first.value
        );
        logs.push(Log::notice(
            format!("#WAV definition has non-.wav extension{detail}"),
            format!("#WAVに拡張子.wavでない定義があります{detail}"),
        ));
    }
    logs
}

/// Checks whether the chart has no notes.
#[must_use]
pub fn check_total_notes_is_zero(file: &BmsFile) -> Option<Log> {
    (file.total_notes == 0).then(|| Log::error("TotalNotes is 0", "トータルノーツ数が0です"))
}

/// Checks notes placed in the measure 0, which some players cannot play.
#[must_use]
pub fn check_notes_in_0th_measure(file: &BmsFile) -> Option<Log> {
    let notes: Vec<String> = file
        .wav_objs
        .iter()
        .take_while(|obj| obj.measure == 0)
        .filter(|obj| channel::is_note(&obj.channel))
        .map(|obj| obj.describe(Some(file)))
        .collect();
    (!notes.is_empty()).then(|| {
        Log::warning(
            "Note exists in 0th measure",
            "0小節目にノーツが配置されています",
        )
        .with_list(notes)
    })
}

/// Checks objects placed without definitions and definitions never placed, for each object type.
///
/// All logs of placed objects come first, then all logs of definitions.
#[must_use]
pub fn check_placed_and_defined(file: &BmsFile) -> Vec<Log> {
    let lnobj = file.lnobj();
    let targets: [(ObjType, &[IndexedDef], &[BmsObj], &str, &str); 5] = [
        (ObjType::Bmp, &file.bmp_defs, &file.bmp_objs, "00", ""),
        (ObjType::Wav, &file.wav_defs, &file.wav_objs, "00", lnobj.as_str()),
        (
            ObjType::ExtendedBpm,
            &file.bpm_defs,
            &file.extended_bpm_objs,
            "",
            "",
        ),
        (ObjType::Stop, &file.stop_defs, &file.stop_objs, "", ""),
        (ObjType::Scroll, &file.scroll_defs, &file.scroll_objs, "", ""),
    ];
    let mut placed_logs = Vec::new();
    let mut defined_logs = Vec::new();
    for (obj_type, defs, objs, ignored_def, ignored_obj) in targets {
        let label = obj_type.label();
        let mut used: HashMap<&str, bool> =
            defs.iter().map(|def| (def.index.as_str(), false)).collect();
        let mut undefined = BTreeSet::new();
        for obj in objs {
            let value36 = obj.value36();
            match used.get_mut(value36.as_str()) {
                Some(flag) => *flag = true,
                None if value36 != ignored_obj => {
                    undefined.insert(obj.value);
                }
                None => {}
            }
        }
        if !undefined.is_empty() {
            placed_logs.push(
                Log::warning(
                    format!("Placed {label} object is undefined"),
                    format!("配置されている{label}オブジェが未定義です"),
                )
                .with_list(
                    undefined
                        .iter()
                        .map(|&value| super::obj::to_base36(value).to_ascii_uppercase()),
                ),
            );
        }
        let unplaced: Vec<String> = defs
            .iter()
            .filter(|def| !used.get(def.index.as_str()).copied().unwrap_or(false))
            .filter(|def| def.index != ignored_def)
            .map(|def| format!("{} ({})", def.index.to_ascii_uppercase(), def.value))
            .collect();
        if !unplaced.is_empty() {
            defined_logs.push(
                Log::warning(
                    format!("Defined {label} object is not placed"),
                    format!("定義されている{label}オブジェが未配置です"),
                )
                .with_list(unplaced),
            );
        }
    }
    placed_logs.append(&mut defined_logs);
    placed_logs
}

/// Checks whether `#WAV00`, the explosion sound of mines, is defined without mines.
#[must_use]
pub fn check_mine_explosion_sound(file: &BmsFile) -> Option<Log> {
    if !file.mine_objs.is_empty() {
        return None;
    }
    let def = file.wav_defs.iter().find(|def| def.index == "00")?;
    Some(Log::warning(
        format!(
            "Defined mine explision wav(#WAV00) is not used: {}",
            def.value
        ),
        format!(
            "定義されている地雷爆発音(#WAV00)は使用されていません: {}",
            def.value
        ),
    ))
}

/// Checks the same defined sound placed more than once at a moment.
#[must_use]
pub fn check_wav_duplicates(file: &BmsFile) -> Vec<Log> {
    let mut logs = Vec::new();
    for moment in moments(&file.wav_objs) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut duplicates = Vec::new();
        for obj in moment {
            let value36 = obj.value36();
            if file
                .defined_value(ObjType::Wav, &value36)
                .is_none_or(str::is_empty)
            {
                continue;
            }
            let count = counts.entry(value36.clone()).or_default();
            *count += 1;
            if *count == 2 {
                duplicates.push(value36);
            }
        }
        let Some(first) = moment.first() else {
            continue;
        };
        let position = first.position.reduced();
        for value36 in duplicates {
            let text = format!(
                "#{:03} ({position}) {} ({}) * {}",
                first.measure,
                value36.to_ascii_uppercase(),
                file.defined_value(ObjType::Wav, &value36).unwrap_or(""),
                counts.get(&value36).copied().unwrap_or(0)
            );
            logs.push(Log::warning(
                format!("Placed WAV objects are duplicate: {text}"),
                format!("WAVオブジェが重複して配置されています: {text}"),
            ));
        }
    }
    logs
}

/// Checks notes and mines sharing a lane at a moment.
#[must_use]
pub fn check_note_overlaps(file: &BmsFile) -> Vec<Log> {
    let mut notes: Vec<BmsObj> = file
        .wav_objs
        .iter()
        .filter(|obj| obj.channel != channel::BGM)
        .chain(&file.mine_objs)
        .cloned()
        .collect();
    sort_by_time(&mut notes);
    let mut logs = Vec::new();
    for moment in moments(&notes) {
        let mut lanes: BTreeMap<usize, Vec<&BmsObj>> = BTreeMap::new();
        for obj in moment {
            lanes.entry(channel::lane(&obj.channel)).or_default().push(obj);
        }
        for objs in lanes.values().filter(|objs| objs.len() > 1) {
            let Some(first) = objs.first() else {
                continue;
            };
            let listed: String = objs
                .iter()
                .map(|obj| {
                    format!(
                        "[{}]#WAV{} ",
                        obj.channel.to_ascii_uppercase(),
                        obj.value36().to_ascii_uppercase()
                    )
                })
                .collect();
            let text = format!(
                "#{:03} ({}) {listed}",
                first.measure,
                first.position.reduced()
            );
            logs.push(Log::error(
                format!("Placed notes overlap: {text}"),
                format!("配置されているノーツが重なり合っています: {text}"),
            ));
        }
    }
    logs
}

/// Checks notes and mines inside long notes, and long notes which never end.
#[must_use]
pub fn check_ln_containment(file: &BmsFile) -> Vec<Log> {
    let lnobj = file.lnobj();
    let mut objs: Vec<BmsObj> = file
        .wav_objs
        .iter()
        .filter(|obj| channel::is_note(&obj.channel))
        .chain(&file.mine_objs)
        .cloned()
        .collect();
    sort_by_time(&mut objs);

    let mut logs = Vec::new();
    let mut ongoing: BTreeMap<String, &BmsObj> = BTreeMap::new();
    for moment in moments(&objs) {
        let is_lnobj_end =
            |obj: &BmsObj| !channel::is_mine(&obj.channel) && obj.value36() == lnobj;
        // LNs ending at this moment do not contain the notes of this moment.
        let closing: BTreeSet<String> = moment
            .iter()
            .filter_map(|obj| {
                if channel::is_ln(&obj.channel) {
                    Some(obj.channel.clone())
                } else if is_lnobj_end(obj) {
                    channel::paired_ln(&obj.channel)
                } else {
                    None
                }
            })
            .filter(|ln_channel| ongoing.contains_key(ln_channel))
            .collect();
        for obj in moment {
            if channel::is_ln(&obj.channel) || is_lnobj_end(obj) {
                continue;
            }
            let Some(ln_channel) = channel::paired_ln(&obj.channel) else {
                continue;
            };
            if closing.contains(&ln_channel) {
                continue;
            }
            let Some(&ln_start) = ongoing.get(&ln_channel) else {
                continue;
            };
            let (kind, kind_ja) = if channel::is_mine(&obj.channel) {
                ("Mine", "地雷")
            } else {
                ("Normal", "通常")
            };
            let pair = format!("{} in {}", obj.describe(None), ln_start.describe(None));
            logs.push(Log::error(
                format!("{kind} note is in LN: {pair}"),
                format!("{kind_ja}ノーツがLNの中に配置されています: {pair}"),
            ));
        }
        for obj in moment {
            if channel::is_ln(&obj.channel) {
                if ongoing.remove(&obj.channel).is_none() {
                    ongoing.insert(obj.channel.clone(), obj);
                }
            } else if let Some(ln_channel) =
                channel::paired_ln(&obj.channel).filter(|_| is_lnobj_end(obj))
            {
                ongoing.remove(&ln_channel);
            }
        }
    }

    let mut unfinished: Vec<&BmsObj> = ongoing.into_values().collect();
    unfinished.sort_by(|a, b| a.time().total_cmp(&b.time()));
    logs.extend(unfinished.into_iter().map(|ln_start| {
        let text = ln_start.describe(Some(file));
        Log::error(
            format!("End of LN is missing: {text}"),
            format!("LNの終端がありません: {text}"),
        )
    }));
    logs
}

/// Checks inline BPM objects, whose value must be hexadecimal.
#[must_use]
pub fn check_bpm_objects(file: &BmsFile) -> Vec<Log> {
    file.bpm_objs
        .iter()
        .filter(|obj| i64::from_str_radix(&obj.value36(), 16).is_err())
        .map(|obj| {
            let text = format!(
                "{} (#{:03} ({}))",
                obj.value36().to_ascii_uppercase(),
                obj.measure,
                obj.position
            );
            Log::error(
                format!("BPM object has invalid value: {text}"),
                format!("BPMオブジェの値が無効です: {text}"),
            )
        })
        .collect()
}

/// Checks measure lengths which are not positive or defined twice.
#[must_use]
pub fn check_measure_lengths(file: &BmsFile) -> Vec<Log> {
    let mut logs: Vec<Log> = file
        .measure_lengths
        .iter()
        .filter(|mlen| mlen.value() <= 0.0)
        .map(|mlen| {
            Log::error(
                format!(
                    "#{:03} measure length has invalid value: {}",
                    mlen.measure, mlen.length
                ),
                format!(
                    "#{:03}小節の小節長の値が無効です: {}",
                    mlen.measure, mlen.length
                ),
            )
        })
        .collect();
    for group in file.measure_lengths.chunk_by(|a, b| a.measure == b.measure) {
        let [first, _, ..] = group else {
            continue;
        };
        let lengths = group.iter().map(|mlen| mlen.length.as_str()).join(", ");
        logs.push(Log::warning(
            format!(
                "#{:03} measure length is duplicate: {lengths}",
                first.measure
            ),
            format!("#{:03}小節の小節長が重複しています: {lengths}", first.measure),
        ));
    }
    logs
}

/// Checks moments and notes without keysounds.
///
/// A note has its keysound if it is the `#LNOBJ` end or its `#WAVxx` is defined. If `wav_exists` is given, the defined file must also exist, and nothing is reported unless a note refers a missing file, because the result would be the same as without it.
#[must_use]
pub fn check_without_keysound(file: &BmsFile, wav_exists: Option<&dyn Fn(&str) -> bool>) -> Vec<Log> {
    let lnobj = file.lnobj();
    let notes: Vec<BmsObj> = file
        .wav_objs
        .iter()
        .filter(|obj| channel::is_note(&obj.channel))
        .cloned()
        .collect();

    let (mut moment_count, mut silent_moments) = (0, 0);
    let (mut silent_notes, mut silent_ln_notes) = (0, 0);
    let mut missing_file_is_placed = false;
    for moment in moments(&notes) {
        moment_count += 1;
        let mut is_silent_moment = true;
        for obj in moment {
            let value36 = obj.value36();
            let has_sound = value36 == lnobj
                || file.wav_defs.iter().any(|def| {
                    if def.index != value36 {
                        return false;
                    }
                    let exists = wav_exists.is_none_or(|exists| exists(&def.value));
                    missing_file_is_placed |= !exists;
                    exists
                });
            if has_sound {
                is_silent_moment = false;
            } else if channel::is_ln(&obj.channel) {
                silent_ln_notes += 1;
            } else {
                silent_notes += 1;
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
    if silent_notes + silent_ln_notes > 0 {
        let text = percentage(silent_notes + silent_ln_notes / 2, file.total_notes);
        logs.push(Log::notice(
            format!("Notes without keysound{suffix} exist: {text}"),
            format!("キー音{suffix_ja}の無いノーツがあります: {text}"),
        ));
    }
    logs
}

/// Formats `part` of `whole` as `12.5%(1/8)`.
pub(crate) fn percentage(part: usize, whole: usize) -> String {
    format!(
        "{:.1}%({part}/{whole})",
        part as f64 / whole as f64 * 100.0
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{bms::scan_bms, env::Utf8Detector, log::Level};

    fn scan(source: &str) -> BmsFile {
        scan_bms("test.bms", source.as_bytes(), &Utf8Detector).unwrap()
    }

    fn messages(logs: &[Log]) -> Vec<&str> {
        logs.iter().map(|log| log.message.as_str()).collect()
    }

    #[test]
    fn note_in_ln() {
        let file = scan("#WAV01 a.wav\n#WAV02 b.wav\n#00251:01\n#00351:01\n#00211:0002\n");
        let logs = check_ln_containment(&file);
        assert_eq!(
            messages(&logs),
            ["Normal note is in LN: #002 11 (1/2) #WAV02 in #002 51 (0/1) #WAV01"]
        );
        assert_eq!(logs[0].level, Level::Error);
    }

    #[test]
    fn mine_in_ln_and_unterminated_ln() {
        let file = scan("#WAV01 a.wav\n#001d1:0001\n#00151:01\n#00262:01\n");
        let logs = check_ln_containment(&file);
        assert_eq!(
            messages(&logs),
            [
                "Mine note is in LN: #001 d1 (1/2) #WAV01 in #001 51 (0/1) #WAV01",
                "End of LN is missing: #001 51 (0/1) #WAV01 (a.wav)",
                "End of LN is missing: #002 62 (0/1) #WAV01 (a.wav)",
            ]
        );
    }

    #[test]
    fn notes_at_the_ln_end_are_outside() {
        for note in ["01", "03"] {
            let file = scan(&format!(
                "#WAV01 a.wav\n#WAV02 b.wav\n#WAV03 c.wav\n#00251:02\n#00251:0002\n#00211:00{note}\n"
            ));
            assert_eq!(check_ln_containment(&file), Vec::new(), "note {note}");
        }
        let file = scan("#WAV01 a.wav\n#WAV02 b.wav\n#00251:02\n#00211:01\n");
        assert_eq!(
            messages(&check_ln_containment(&file)),
            ["End of LN is missing: #002 51 (0/1) #WAV02 (b.wav)"]
        );
    }

    #[test]
    fn lnobj_closes_ln() {
        let file = scan("#LNOBJ ZZ\n#WAV01 a.wav\n#00151:01\n#00111:00ZZ\n");
        assert_eq!(check_ln_containment(&file), Vec::new());
    }

    #[test]
    fn header_findings() {
        let file = scan("#PLAYER 5\n#GENRE\n#RANK 0\n#DIFFICULTY 0\n#TOTAL 90\n#WAV01 a.wav\n#00111:01\n");
        let logs = check_header_commands(&file);
        assert_eq!(
            messages(&logs),
            [
                "#PLAYER has invalid value: 5",
                "#GENRE value is empty",
                "#TITLE definition is missing",
                "#ARTIST definition is missing",
                "#BPM definition is missing",
                "#PLAYLEVEL definition is missing",
                "#RANK is 0(VERY HARD)",
                "#TOTAL is under 100: 90",
                "#DIFFICULTY is 0(Undefined)",
            ]
        );
        assert_eq!(logs[2].level, Level::Error);
        assert_eq!(logs[3].level, Level::Warning);
        assert_eq!(logs[2].message_ja, "#TITLE定義が見つかりません");
    }

    #[test]
    fn title_ends_with_subtitle() {
        let file = scan("#TITLE Song [Another]\n#SUBTITLE [another]\n");
        assert_eq!(
            check_title_and_subtitle(&file).map(|log| log.message),
            Some("The end of #TITLE contains the same string as #SUBTITLE: [another]".to_string())
        );
        assert_eq!(check_title_and_subtitle(&scan("#TITLE Song\n#SUBTITLE\n")), None);
    }

    #[test]
    fn valueless_definitions_are_not_scanned() {
        let file = scan("#WAV01\n#WAV02 \n#BMP01 a.bmp\n");
        assert!(file.wav_defs.is_empty());
        let logs = check_indexed_definitions(&file);
        assert!(logs.iter().all(|log| !log.message.ends_with("value is empty")));
    }

    #[test]
    fn indexed_definitions_are_grouped() {
        let file = scan("#WAV01 a.ogg\n#WAV02 b.txt\n#WAV03 c.wav\n#WAV04 d.OGG\n#BPM01 0\n");
        let logs = check_indexed_definitions(&file);
        assert_eq!(
            messages(&logs),
            [
                "#WAV02 has invalid value: b.txt",
                "#BPM01 has invalid value: 0",
                "#WAV definition has non-.wav extension(*2): WAV01 a.ogg etc...",
            ]
        );
        let empty = scan("#BMP01 a.png\n");
        assert_eq!(
            messages(&check_indexed_definitions(&empty)),
            ["#WAVxx definition is missing"]
        );
    }

    #[test]
    fn placed_and_defined() {
        let file = scan(
            "#LNOBJ ZZ\n#WAV00 mine.wav\n#WAV01 a.wav\n#WAV02 b.wav\n#BMP01 a.png\n#00111:01ZZ0A03\n#00104:0201\n",
        );
        let logs = check_placed_and_defined(&file);
        assert_eq!(
            messages(&logs),
            [
                "Placed BMP object is undefined",
                "Placed WAV object is undefined",
                "Defined WAV object is not placed",
            ]
        );
        assert_eq!(logs[0].sub_logs, ["02"]);
        assert_eq!(logs[1].sub_logs, ["03", "0A"]);
        assert_eq!(logs[2].sub_logs, ["02 (b.wav)"]);
    }

    #[test]
    fn mine_sound_without_mines() {
        let file = scan("#WAV00 boom.wav\n");
        assert_eq!(
            check_mine_explosion_sound(&file).map(|log| log.message),
            Some("Defined mine explision wav(#WAV00) is not used: boom.wav".to_string())
        );
        let mined = scan("#WAV00 boom.wav\n#001D1:01\n");
        assert_eq!(check_mine_explosion_sound(&mined), None);
    }

    #[test]
    fn wav_duplicates_and_overlaps() {
        let file = scan(
            "#WAV01 a.wav\n#WAV02 b.wav\n#00101:01\n#00101:01\n#00111:0002\n#00111:0002\n",
        );
        assert_eq!(
            messages(&check_wav_duplicates(&file)),
            [
                "Placed WAV objects are duplicate: #001 (0/1) 01 (a.wav) * 2",
                "Placed WAV objects are duplicate: #001 (1/2) 02 (b.wav) * 2",
            ]
        );
        assert_eq!(
            messages(&check_note_overlaps(&file)),
            ["Placed notes overlap: #001 (1/2) [11]#WAV02 [11]#WAV02 "]
        );
    }

    #[test]
    fn notes_in_0th_measure() {
        let file = scan("#WAV01 a.wav\n#00001:01\n#00016:01\n#00111:01\n");
        let log = check_notes_in_0th_measure(&file).unwrap();
        assert_eq!(log.sub_logs, ["#000 16 (0/1) #WAV01 (a.wav)"]);
    }

    #[test]
    fn bpm_objects_and_measure_lengths() {
        let file = scan("#00103:0G78\n#00202:0.5\n#00202:0.75\n#00302:0\n");
        assert_eq!(
            messages(&check_bpm_objects(&file)),
            ["BPM object has invalid value: 0G (#001 (0/2))"]
        );
        assert_eq!(
            messages(&check_measure_lengths(&file)),
            [
                "#003 measure length has invalid value: 0",
                "#002 measure length is duplicate: 0.5, 0.75",
            ]
        );
    }

    #[test]
    fn keysound() {
        let file = scan("#WAV01 a.wav\n#00111:01\n#00112:02\n#00113:0002\n");
        assert_eq!(
            messages(&check_without_keysound(&file, None)),
            [
                "Moments without keysound exist: 50.0%(1/2)",
                "Notes without keysound exist: 66.7%(2/3)",
            ]
        );
        let exists = |path: &str| path != "a.wav";
        assert_eq!(
            messages(&check_without_keysound(&file, Some(&exists))),
            [
                "Moments without keysound (or audio file) exist: 100.0%(2/2)",
                "Notes without keysound (or audio file) exist: 100.0%(3/3)",
            ]
        );
        let all = |_: &str| true;
        assert_eq!(check_without_keysound(&file, Some(&all)), Vec::new());
    }

    #[test]
    fn total_notes_zero() {
        let mut file = scan("#PLAYER 1\n");
        check_bms_file(&mut file);
        assert!(file.logs.iter().any(|log| log.message == "TotalNotes is 0"));
    }
}
