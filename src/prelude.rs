//! Prelude module for the checker.
//!
//! This module re-exports the types and functions needed to scan and check charts. You can use `use bms_check::prelude::*;` to import them at once.

pub use crate::{
    bms::{
        BmsFile, BmsObj, DuplicateDefinition, Fraction, IndexedDef, InvalidLine, MeasureLength,
        ObjType, ScanError,
        check::{check_bms_file, check_without_keysound},
        scan_bms,
    },
    diff::{EditOp, onp},
    dir::{
        BmsDirectory, CheckError, CheckOptions, NonBmsFile, SubDirectory, Usage, UsageMap,
        check_directory, is_chart_file,
    },
    env::{AudioProbe, CharsetDetector, NoAudioProbe, Utf8Detector},
    log::{Lang, Level, Log, Logs, SubLogType},
    total::{TotalJudge, default_total, judge_total},
};

#[cfg(feature = "bmson")]
pub use crate::bmson::{
    Bmson, BmsonError, BmsonFile, BmsonInfo, NoteX, check::check_bmson_file, scan_bmson,
};

#[cfg(feature = "diagnostics")]
pub use crate::diagnostics::{
    SimpleSource, ToAriadne, build_report, collect_bms_file_reports, emit_bms_file_diagnostics,
};

#[cfg(all(feature = "diagnostics", feature = "bmson"))]
pub use crate::diagnostics::emit_bmson_errors;
