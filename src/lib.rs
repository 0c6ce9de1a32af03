//! The BMS/bmson chart checker.
//!
//! This crate scans rhythm game chart files and reports problems about them as [`log::Log`]s. It covers two formats:
//!
//! - BMS (`.bms`/`.bme`/`.bml`/`.pms`), the line oriented text format, in [`bms`].
//! - bmson, the JSON based format, in [`bmson`] (requires `bmson` feature).
//!
//! Checking runs in three steps:
//!
//! 1. Scan a file from bytes with [`bms::scan_bms`] or [`bmson::scan_bmson`]. Scanning records findings of the syntax level (duplicated definitions, invalid lines, unknown fields and so on).
//! 2. Run the per file checks with [`bms::check::check_bms_file`] or [`bmson::check::check_bmson_file`].
//! 3. Gather the charts of one folder into a [`dir::BmsDirectory`] and run [`dir::check_directory`], which compares the sibling charts with each other and with the other files in the folder.
//!
//! File system access, audio decoding and charset detection are not done here, they are injected through the traits in [`env`].
//!
//! # Usage Example
//!
//! ```rust
//! use bms_check::prelude::*;
//!
//! let source = "#PLAYER 1\n#TITLE Song\n#BPM 150\n#WAV01 kick.wav\n#00111:01\n";
//! let mut file = scan_bms("song.bms", source.as_bytes(), &Utf8Detector).unwrap();
//! check_bms_file(&mut file);
//!
//! for log in file.logs.iter() {
//!     println!("{}", log.render(Lang::En));
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bms;
#[cfg(feature = "bmson")]
pub mod bmson;
pub mod command;
pub mod diagnostics;
pub mod diff;
pub mod dir;
pub mod env;
pub mod log;
pub mod path;
pub mod prelude;
pub mod total;
