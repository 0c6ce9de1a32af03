//! Example: Check chart files and folders from the command line
//!
//! Each path is either a chart file or a folder. A folder which directly contains charts is checked as one song, with the directory checks. Other folders are searched for such song folders.
//!
//! ```sh
//! cargo run --example checkbms -- --lang ja --diff path/to/songs
//! RUST_LOG=bms_check=debug cargo run --example checkbms -- song.bms
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use bms_check::prelude::*;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "checkbms", about = "Checks BMS and bmson charts")]
struct Cli {
    /// Chart files or folders to check
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Compare every pair of charts in a folder in detail
    #[arg(long)]
    diff: bool,

    /// Language of the logs, `en` or `ja`
    #[arg(long, default_value = "en")]
    lang: Lang,

    /// Output the results as JSON
    #[arg(long)]
    json: bool,

    /// Show source reports of invalid lines and duplicate definitions
    #[arg(long)]
    report: bool,
}

fn read(path: &Path) -> Result<Vec<u8>, CheckError> {
    fs::read(path).map_err(|source| CheckError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn has_charts(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok_and(|entries| {
        entries
            .filter_map(Result::ok)
            .any(|entry| entry.path().is_file() && is_chart_file(&slash_path(&entry.path())))
    })
}

/// Prints a chart which failed to load, in the same shape as other chart logs.
fn print_load_error(cli: &Cli, path: &str, error: &CheckError, bytes: Option<&[u8]>) {
    let log = match error {
        CheckError::Bmson(error) => {
            if let (BmsonError::InvalidJson { errors }, Some(bytes), false) =
                (error, bytes, cli.json)
            {
                let text = String::from_utf8_lossy(bytes);
                emit_bmson_errors(path, &text, errors);
            }
            error.to_log()
        }
        other => Log::error(other.to_string(), ""),
    };
    println!("# BmsFile checklog: {path}\n{}\n", log.render(cli.lang));
}

fn load_directory(cli: &Cli, root: &Path) -> BmsDirectory {
    let mut dir = BmsDirectory::new(slash_path(root));
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(%error, "failed to walk");
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = slash_path(relative);
        if entry.file_type().is_dir() {
            let is_empty = fs::read_dir(entry.path()).is_ok_and(|mut entries| entries.next().is_none());
            dir.directories.push(SubDirectory {
                path: relative,
                is_empty,
            });
        } else if is_chart_file(&relative) {
            let bytes = match read(entry.path()) {
                Ok(bytes) => bytes,
                Err(error) => {
                    print_load_error(cli, &relative, &error, None);
                    continue;
                }
            };
            if let Err(error) = dir.add_chart(&relative, &bytes, &Utf8Detector) {
                print_load_error(cli, &relative, &error, Some(&bytes));
            }
        } else {
            dir.non_bms_files.push(NonBmsFile::new(relative));
        }
    }

    for file in &mut dir.bms_files {
        check_bms_file(file);
    }
    for file in &mut dir.bmson_files {
        check_bmson_file(file);
    }
    let options = CheckOptions {
        diff: cli.diff,
        lang: cli.lang,
    };
    check_directory(&mut dir, &options, &NoAudioProbe);
    dir
}

fn print_directory(cli: &Cli, dir: &BmsDirectory) -> Result<(), serde_json::Error> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(dir)?);
        return Ok(());
    }
    for file in &dir.bms_files {
        if cli.report {
            emit_bms_file_diagnostics(file);
        }
        let log = file.log_string(cli.lang);
        if !log.is_empty() {
            println!("{log}\n");
        }
    }
    for file in &dir.bmson_files {
        let log = file.log_string(cli.lang);
        if !log.is_empty() {
            println!("{log}\n");
        }
    }
    let log = dir.log_string(cli.lang);
    if !log.is_empty() {
        println!("{log}\n");
    }
    Ok(())
}

fn check_file(cli: &Cli, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let name = slash_path(path);
    let bytes = read(path)?;
    let mut dir = BmsDirectory::new(".");
    if let Err(error) = dir.add_chart(&name, &bytes, &Utf8Detector) {
        print_load_error(cli, &name, &error, Some(&bytes));
        return Ok(());
    }
    for file in &mut dir.bms_files {
        check_bms_file(file);
    }
    for file in &mut dir.bmson_files {
        check_bmson_file(file);
    }
    print_directory(cli, &dir)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    for path in &cli.paths {
        if path.is_file() {
            check_file(&cli, path)?;
            continue;
        }
        let mut walker = WalkDir::new(path).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = entry?;
            if !entry.file_type().is_dir() || !has_charts(entry.path()) {
                continue;
            }
            let dir = load_directory(&cli, entry.path());
            print_directory(&cli, &dir)?;
            walker.skip_current_dir();
        }
    }
    Ok(())
}
