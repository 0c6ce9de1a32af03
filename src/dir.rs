//! Checks over a folder of sibling charts.
//!
//! A [`BmsDirectory`] holds the scanned charts of one folder together with the other files in it. [`check_directory`] checks references from the charts to the files, compares the sibling charts with each other, and records the findings into the logs of the directory (and some into the logs of each chart).
//!
//! The file system is never touched here. The driver lists the folder, reads the bytes of the charts, and fills a [`BmsDirectory`] with relative, `/` separated paths.
//!
//! # Usage Example
//!
//! ```rust
//! use bms_check::prelude::*;
//!
//! let mut dir = BmsDirectory::new("song");
//! dir.add_chart("normal.bms", b"#TITLE Song\n#WAV01 kick.wav\n#00111:01\n", &Utf8Detector)
//!     .unwrap();
//! dir.add_chart("hyper.bms", b"#TITLE Song\n#WAV01 snare.wav\n#00111:01\n", &Utf8Detector)
//!     .unwrap();
//! dir.non_bms_files.push(NonBmsFile::new("kick.ogg"));
//!
//! let usage = check_directory(&mut dir, &CheckOptions::default(), &NoAudioProbe);
//! assert!(usage.get("kick.ogg").by_bms);
//! assert!(dir.logs.iter().any(|log| log.message == "#WAVxx are not unified"));
//! ```

pub mod compare;
pub mod files;
pub mod unify;

use std::collections::HashMap;

use thiserror::Error;
use tracing::info;

#[cfg(feature = "bmson")]
use crate::bmson::{BmsonError, BmsonFile, scan_bmson};
use crate::{
    bms::{BmsFile, ScanError, scan_bms},
    env::{AudioProbe, CharsetDetector},
    log::{Lang, Level, Logs},
    path::{clean, extension},
};

/// Extensions of BMS charts.
pub const BMS_EXTS: &[&str] = &[".bms", ".bme", ".bml", ".pms"];
/// Extension of bmson charts.
pub const BMSON_EXT: &str = ".bmson";

/// Whether `path` is a chart file by its extension.
#[must_use]
pub fn is_chart_file(path: &str) -> bool {
    let ext = extension(path);
    BMS_EXTS.iter().any(|bms| bms.eq_ignore_ascii_case(ext)) || BMSON_EXT.eq_ignore_ascii_case(ext)
}

/// A fatal error while loading a chart. The chart is left out of the directory.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CheckError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The BMS chart could not be scanned.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// The bmson chart could not be scanned.
    #[cfg(feature = "bmson")]
    #[error(transparent)]
    Bmson(#[from] BmsonError),
    /// The file is not a chart.
    #[error("not a chart file: {0}")]
    NotAChart(String),
}

/// A file in the folder other than charts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NonBmsFile {
    /// Path relative to the folder.
    pub path: String,
}

impl NonBmsFile {
    /// Creates a file at `path`, normalizing its separators.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            path: clean(path.as_ref()),
        }
    }
}

/// A directory in the folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubDirectory {
    /// Path relative to the folder.
    pub path: String,
    /// Whether it has no entries at all.
    pub is_empty: bool,
}

/// Which kind of charts use a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Usage {
    /// Referred by a BMS chart.
    pub by_bms: bool,
    /// Referred by a bmson chart.
    pub by_bmson: bool,
}

impl Usage {
    /// Whether any chart refers the file.
    #[must_use]
    pub const fn by_any(self) -> bool {
        self.by_bms || self.by_bmson
    }
}

/// Usage of the non-chart files, by their paths. Filled by a single [`check_directory`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UsageMap(HashMap<String, Usage>);

impl UsageMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the file at `path` as used by a bmson chart if `by_bmson`, otherwise by a BMS chart.
    pub fn mark(&mut self, path: &str, by_bmson: bool) {
        let usage = self.0.entry(path.to_string()).or_default();
        if by_bmson {
            usage.by_bmson = true;
        } else {
            usage.by_bms = true;
        }
    }

    /// Usage of the file at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Usage {
        self.0.get(path).copied().unwrap_or_default()
    }
}

/// Options of [`check_directory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckOptions {
    /// Whether to compare every pair of charts in detail.
    pub diff: bool,
    /// Language to render the logs in.
    pub lang: Lang,
}

/// A folder of sibling charts.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BmsDirectory {
    /// Path of the folder.
    pub path: String,
    /// BMS charts in the folder.
    pub bms_files: Vec<BmsFile>,
    /// bmson charts in the folder.
    #[cfg(feature = "bmson")]
    pub bmson_files: Vec<BmsonFile>,
    /// Other files in the folder and its subdirectories.
    pub non_bms_files: Vec<NonBmsFile>,
    /// Subdirectories of the folder.
    pub directories: Vec<SubDirectory>,
    /// Findings, in display order.
    pub logs: Logs,
}

impl BmsDirectory {
    /// Creates an empty directory at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Scans `bytes` of the chart at `path`, relative to the folder, and adds it.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::NotAChart`] if `path` does not have a chart extension, or the error of scanning.
    pub fn add_chart(
        &mut self,
        path: &str,
        bytes: &[u8],
        detector: &impl CharsetDetector,
    ) -> Result<(), CheckError> {
        let path = clean(path);
        #[cfg(feature = "bmson")]
        if extension(&path).eq_ignore_ascii_case(BMSON_EXT) {
            self.bmson_files.push(scan_bmson(path, bytes)?);
            return Ok(());
        }
        if !is_chart_file(&path) {
            return Err(CheckError::NotAChart(path));
        }
        self.bms_files.push(scan_bms(path, bytes, detector)?);
        Ok(())
    }

    /// Number of charts in the folder.
    #[must_use]
    pub fn chart_count(&self) -> usize {
        #[cfg(feature = "bmson")]
        let bmson = self.bmson_files.len();
        #[cfg(not(feature = "bmson"))]
        let bmson = 0;
        self.bms_files.len() + bmson
    }

    /// Paths and hashes of all charts, BMS charts first.
    pub(crate) fn chart_hashes(&self) -> Vec<(&str, &str)> {
        let bms = self
            .bms_files
            .iter()
            .map(|file| (file.path.as_str(), file.sha256.as_str()));
        #[cfg(feature = "bmson")]
        let bms = bms.chain(
            self.bmson_files
                .iter()
                .map(|file| (file.path.as_str(), file.sha256.as_str())),
        );
        bms.collect()
    }

    /// Renders the logs with a title line, or an empty string if there are no logs.
    #[must_use]
    pub fn log_string(&self, lang: Lang) -> String {
        if self.logs.is_empty() {
            return String::new();
        }
        format!("## BmsDirectory checklog: {}\n{}", self.path, self.logs.render(lang))
    }
}

/// Runs the directory checks, and returns which files are used by the charts.
///
/// The per file checks are expected to be done before. Logs are recorded in this order: missing files, metadata not unified, unused files, empty directories, environment dependent file names, long audio files, identical charts, definitions not unified, object structures not unified, and the pairwise differences if [`CheckOptions::diff`] is set. Keysound coverage considering missing files is appended to each chart.
pub fn check_directory(
    dir: &mut BmsDirectory,
    options: &CheckOptions,
    probe: &impl AudioProbe,
) -> UsageMap {
    let mut usage = UsageMap::new();
    let mut logs = files::check_defined_files_exist(dir, &mut usage);
    files::check_keysounds_exist(dir);
    logs.extend(unify::check_metadata_unified(dir));
    logs.extend(files::check_unused_files(dir, &usage));
    logs.extend(files::check_empty_directories(dir));
    logs.extend(files::check_environment_dependent_names(dir, &usage));
    logs.extend(files::check_long_audio_files(dir, &usage, probe));
    logs.extend(unify::check_same_hash_charts(dir));
    logs.extend(unify::check_indexed_definitions_unified(dir));
    logs.extend(unify::check_object_structures_unified(dir));
    if options.diff {
        logs.extend(compare::check_pairwise_differences(dir));
    }
    dir.logs.extend(logs);

    info!(
        path = %dir.path,
        charts = dir.chart_count(),
        files = dir.non_bms_files.len(),
        errors = dir.logs.count(Level::Error),
        warnings = dir.logs.count(Level::Warning),
        "checked directory"
    );
    usage
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::env::Utf8Detector;

    #[test]
    fn chart_files() {
        assert!(is_chart_file("a.BME"));
        assert!(is_chart_file("sub/a.bmson"));
        assert!(!is_chart_file("a.bmx"));
        assert!(!is_chart_file("bms"));
    }

    #[test]
    fn add_chart_dispatches_by_extension() {
        let mut dir = BmsDirectory::new("song");
        dir.add_chart("./a.bms", b"#TITLE a\n", &Utf8Detector).unwrap();
        assert_eq!(dir.bms_files[0].path, "a.bms");
        assert!(matches!(
            dir.add_chart("readme.txt", b"", &Utf8Detector),
            Err(CheckError::NotAChart(path)) if path == "readme.txt"
        ));
        #[cfg(feature = "bmson")]
        {
            dir.add_chart("b.bmson", br#"{"version": "1.0.0"}"#, &Utf8Detector)
                .unwrap();
            assert!(matches!(
                dir.add_chart("c.bmson", b"{", &Utf8Detector),
                Err(CheckError::Bmson(_))
            ));
            assert_eq!(dir.chart_count(), 2);
        }
    }

    #[test]
    fn usage_map() {
        let mut usage = UsageMap::new();
        usage.mark("a.ogg", false);
        usage.mark("b.png", true);
        assert_eq!(usage.get("a.ogg"), Usage { by_bms: true, by_bmson: false });
        assert!(usage.get("b.png").by_any());
        assert!(!usage.get("c.png").by_any());
    }

    #[test]
    fn log_string_has_title() {
        let mut dir = BmsDirectory::new("song");
        assert_eq!(dir.log_string(Lang::En), "");
        dir.logs.push(crate::log::Log::notice("This directory is empty: bga", ""));
        assert_eq!(
            dir.log_string(Lang::En),
            "## BmsDirectory checklog: song\nNOTICE: This directory is empty: bga"
        );
    }
}
