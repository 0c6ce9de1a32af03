//! Detailed comparison of every pair of BMS charts in a folder.

use itertools::Itertools;

use crate::{
    bms::{BmsFile, BmsObj, obj::ObjType},
    diff::{EditOp, onp},
    log::Log,
};

use super::BmsDirectory;

/// Lists definitions of `obj_type` which only one of the charts has.
///
/// Each item is `Missing(path): #WAV01 kick.wav`, naming the chart which lacks the definition.
#[must_use]
pub fn diff_definitions(a: &BmsFile, b: &BmsFile, obj_type: ObjType) -> Vec<String> {
    let sequence = |file: &BmsFile| -> Vec<String> {
        file.defs(obj_type)
            .iter()
            .map(|def| format!("#{} {}", def.command(), def.value))
            .collect()
    };
    let (a_defs, b_defs) = (sequence(a), sequence(b));
    let (_, ops) = onp(&a_defs, &b_defs);

    let (mut a_iter, mut b_iter) = (a_defs.iter(), b_defs.iter());
    let mut missing = Vec::new();
    for op in ops {
        match op {
            EditOp::Equal => {
                a_iter.next();
                b_iter.next();
            }
            EditOp::Insert => {
                if let Some(def) = b_iter.next() {
                    missing.push(format!("Missing({}): {def}", a.path));
                }
            }
            EditOp::Delete => {
                if let Some(def) = a_iter.next() {
                    missing.push(format!("Missing({}): {def}", b.path));
                }
            }
        }
    }
    missing
}

fn is_defined(file: &BmsFile, obj: &BmsObj) -> bool {
    file.defined_value(obj.obj_type, &obj.value36()).is_some()
}

/// Lists placed objects of `obj_type` which only one of the charts has, walking both in time order.
///
/// Objects are the same if they are at the same time with the same value. Ends of long notes are skipped, and objects without definitions are not listed.
#[must_use]
pub fn diff_objects(a: &BmsFile, b: &BmsFile, obj_type: ObjType) -> Vec<String> {
    let mut a_objs = a.objs(obj_type).iter().filter(|obj| !obj.is_ln_end).peekable();
    let mut b_objs = b.objs(obj_type).iter().filter(|obj| !obj.is_ln_end).peekable();
    let lacked_by_b = |obj: &BmsObj| {
        is_defined(a, obj).then(|| format!("Missing({}): {}", b.path, obj.describe(Some(a))))
    };
    let lacked_by_a = |obj: &BmsObj| {
        is_defined(b, obj).then(|| format!("Missing({}): {}", a.path, obj.describe(Some(b))))
    };

    let mut missing = Vec::new();
    loop {
        match (a_objs.peek(), b_objs.peek()) {
            (Some(a_obj), Some(b_obj)) => {
                if a_obj.same_time(b_obj) && a_obj.value == b_obj.value {
                    a_objs.next();
                    b_objs.next();
                } else if a_obj.time() < b_obj.time()
                    || (a_obj.same_time(b_obj) && a_obj.value < b_obj.value)
                {
                    missing.extend(lacked_by_b(a_obj));
                    a_objs.next();
                } else {
                    missing.extend(lacked_by_a(b_obj));
                    b_objs.next();
                }
            }
            (Some(a_obj), None) => {
                missing.extend(lacked_by_b(a_obj));
                a_objs.next();
            }
            (None, Some(b_obj)) => {
                missing.extend(lacked_by_a(b_obj));
                b_objs.next();
            }
            (None, None) => break,
        }
    }
    missing
}

/// Reports differences of definitions and objects for every pair of BMS charts which are not identical.
pub fn check_pairwise_differences(dir: &BmsDirectory) -> Vec<Log> {
    let mut logs = Vec::new();
    for (a, b) in dir.bms_files.iter().tuple_combinations() {
        if a.sha256 == b.sha256 {
            continue;
        }
        for obj_type in [ObjType::Wav, ObjType::Bmp] {
            let missing = diff_definitions(a, b, obj_type);
            if missing.is_empty() {
                continue;
            }
            let (label, count) = (obj_type.label(), missing.len());
            logs.push(
                Log::warning(
                    format!(
                        "There are {count} differences in {label} definitions: {} {}",
                        a.path, b.path
                    ),
                    format!("{label}定義に{count}個の違いがあります: {} {}", a.path, b.path),
                )
                .with_detail(missing),
            );
        }
        for obj_type in [ObjType::Wav, ObjType::Bmp] {
            let missing = diff_objects(a, b, obj_type);
            if missing.is_empty() {
                continue;
            }
            let (label, count) = (obj_type.label(), missing.len());
            logs.push(
                Log::warning(
                    format!(
                        "There are {count} differences in {label} objects: {}, {}",
                        a.path, b.path
                    ),
                    format!("{label}オブジェに{count}個の違いがあります: {} {}", a.path, b.path),
                )
                .with_detail(missing),
            );
        }
    }
    logs
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{bms::scan_bms, env::Utf8Detector};

    fn scan(path: &str, source: &str) -> BmsFile {
        scan_bms(path, source.as_bytes(), &Utf8Detector).unwrap()
    }

    #[test]
    fn definitions() {
        let a = scan("a.bms", "#WAV01 a.wav\n#WAV02 b.wav\n#WAV03 c.wav\n");
        let b = scan("b.bms", "#WAV01 a.wav\n#WAV03 c.wav\n#WAV04 d.wav\n");
        assert_eq!(
            diff_definitions(&a, &b, ObjType::Wav),
            vec!["Missing(b.bms): #WAV02 b.wav", "Missing(a.bms): #WAV04 d.wav"]
        );
        assert!(diff_definitions(&a, &b, ObjType::Bmp).is_empty());
    }

    #[test]
    fn objects() {
        let a = scan("a.bms", "#WAV01 a.wav\n#WAV02 b.wav\n#00111:0102\n#00211:01\n");
        let b = scan("b.bms", "#WAV01 a.wav\n#00111:0100\n#00112:01\n#00211:0101\n");
        assert_eq!(
            diff_objects(&a, &b, ObjType::Wav),
            vec![
                "Missing(a.bms): #001 12 (0/1) #WAV01 (a.wav)",
                "Missing(b.bms): #001 11 (1/2) #WAV02 (b.wav)",
                "Missing(a.bms): #002 11 (1/2) #WAV01 (a.wav)",
            ]
        );
    }

    #[test]
    fn pairs() {
        let mut dir = BmsDirectory::new("song");
        dir.add_chart("a.bms", b"#WAV01 a.wav\n#00111:01\n", &Utf8Detector).unwrap();
        dir.add_chart("b.bms", b"#WAV01 a.wav\n#00111:01\n", &Utf8Detector).unwrap();
        dir.add_chart("c.bms", b"#WAV01 a.wav\n#WAV02 b.wav\n#00111:0102\n", &Utf8Detector)
            .unwrap();
        let logs = check_pairwise_differences(&dir);
        let messages: Vec<_> = logs.iter().map(|log| log.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "There are 1 differences in WAV definitions: a.bms c.bms",
                "There are 1 differences in WAV objects: a.bms, c.bms",
                "There are 1 differences in WAV definitions: b.bms c.bms",
                "There are 1 differences in WAV objects: b.bms, c.bms",
            ]
        );
        assert_eq!(logs[0].message_ja, "WAV定義に1個の違いがあります: a.bms c.bms");
        assert_eq!(logs[1].sub_logs, vec!["Missing(a.bms): #001 11 (1/2) #WAV02 (b.wav)"]);
    }
}
