//! Rule tables of header commands.
//!
//! Each BMS header command (`#TITLE`, `#WAVxx`, ...) and each bmson `info` field has a [`CommandRule`], which tells its value type, how much it is required, and which values are valid.

use std::sync::LazyLock;

use regex::Regex;

use crate::path::has_ext;

/// Accepted extensions of audio files.
pub const AUDIO_EXTS: &[&str] = &[".wav", ".ogg", ".flac", ".mp3"];
/// Accepted extensions of image files.
pub const IMAGE_EXTS: &[&str] = &[".bmp", ".png", ".jpg", ".jpeg", ".gif"];
/// Accepted extensions of movie files.
pub const MOVIE_EXTS: &[&str] = &[
    ".mpg", ".mpeg", ".wmv", ".avi", ".mp4", ".webm", ".m4v", ".m1v", ".m2v",
];
/// Accepted extensions of `#BMPxx`, images and movies.
pub const BMP_EXTS: &[&str] = &[
    ".bmp", ".png", ".jpg", ".jpeg", ".gif", ".mpg", ".mpeg", ".wmv", ".avi", ".mp4", ".webm",
    ".m4v", ".m1v", ".m2v",
];

/// Smallest positive value of `f64`, the lower bound of positive only values such as BPM.
pub const SMALLEST_POSITIVE: f64 = f64::from_bits(1);

/// Type of a command value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    /// Integer.
    Int,
    /// Floating point number.
    Float,
    /// Any text.
    String,
    /// File path.
    Path,
}

/// How much a command is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Necessity {
    /// Missing it is an error.
    Necessary,
    /// Missing it is a warning.
    SemiNecessary,
    /// It may be missing.
    Unnecessary,
}

/// Constraint on the value of a command.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// No constraint other than the type.
    None,
    /// Inclusive integer range.
    IntRange(i64, i64),
    /// Inclusive float range.
    FloatRange(f64, f64),
    /// The value must match one of the patterns.
    Patterns(Vec<Regex>),
    /// The value must have one of the extensions.
    Extensions(&'static [&'static str]),
}

/// A rule of a command.
#[derive(Debug, Clone)]
pub struct CommandRule {
    /// Lowercase name of the command, without `#`.
    pub name: &'static str,
    /// Type of the value.
    pub command_type: CommandType,
    /// How much the command is required.
    pub necessity: Necessity,
    /// Constraint on the value.
    pub constraint: Constraint,
}

impl CommandRule {
    const fn new(
        name: &'static str,
        command_type: CommandType,
        necessity: Necessity,
        constraint: Constraint,
    ) -> Self {
        Self {
            name,
            command_type,
            necessity,
            constraint,
        }
    }

    /// Whether `value` satisfies the type and the constraint of the rule.
    #[must_use]
    pub fn is_valid(&self, value: &str) -> bool {
        match (self.command_type, &self.constraint) {
            (CommandType::Int, Constraint::IntRange(min, max)) => value
                .parse::<i64>()
                .is_ok_and(|v| (*min..=*max).contains(&v)),
            (CommandType::Int, _) => value.parse::<i64>().is_ok(),
            (CommandType::Float, Constraint::FloatRange(min, max)) => value
                .parse::<f64>()
                .is_ok_and(|v| (*min..=*max).contains(&v)),
            (CommandType::Float, _) => value.parse::<f64>().is_ok(),
            (CommandType::String | CommandType::Path, Constraint::Patterns(patterns)) => {
                patterns.iter().any(|pattern| pattern.is_match(value))
            }
            (CommandType::String | CommandType::Path, Constraint::Extensions(exts)) => {
                has_ext(value, exts)
            }
            (CommandType::String, _) => true,
            (CommandType::Path, _) => false,
        }
    }
}

fn patterns(sources: &[&str]) -> Constraint {
    Constraint::Patterns(
        sources
            .iter()
            .map(|source| Regex::new(source).expect("valid regex"))
            .collect(),
    )
}

/// Rules of the BMS header commands, in checking order.
pub static HEADER_COMMANDS: LazyLock<Vec<CommandRule>> = LazyLock::new(|| {
    use CommandType::*;
    use Necessity::*;
    vec![
        CommandRule::new("player", Int, Necessary, Constraint::IntRange(1, 4)),
        CommandRule::new("genre", String, SemiNecessary, Constraint::None),
        CommandRule::new("title", String, Necessary, Constraint::None),
        CommandRule::new("artist", String, SemiNecessary, Constraint::None),
        CommandRule::new("subtitle", String, Unnecessary, Constraint::None),
        CommandRule::new("subartist", String, Unnecessary, Constraint::None),
        CommandRule::new(
            "bpm",
            Float,
            Necessary,
            Constraint::FloatRange(SMALLEST_POSITIVE, f64::MAX),
        ),
        CommandRule::new(
            "playlevel",
            Int,
            SemiNecessary,
            Constraint::IntRange(0, i64::MAX),
        ),
        CommandRule::new("rank", Int, SemiNecessary, Constraint::IntRange(0, 4)),
        CommandRule::new(
            "defexrank",
            Float,
            Unnecessary,
            Constraint::FloatRange(0.0, f64::MAX),
        ),
        CommandRule::new(
            "total",
            Float,
            SemiNecessary,
            Constraint::FloatRange(0.0, f64::MAX),
        ),
        CommandRule::new("difficulty", Int, SemiNecessary, Constraint::IntRange(0, 5)),
        CommandRule::new("stagefile", Path, Unnecessary, Constraint::Extensions(IMAGE_EXTS)),
        CommandRule::new("banner", Path, Unnecessary, Constraint::Extensions(IMAGE_EXTS)),
        CommandRule::new("backbmp", Path, Unnecessary, Constraint::Extensions(IMAGE_EXTS)),
        CommandRule::new("preview", Path, Unnecessary, Constraint::Extensions(AUDIO_EXTS)),
        CommandRule::new("lntype", Int, Unnecessary, Constraint::IntRange(1, 2)),
        CommandRule::new("lnobj", String, Unnecessary, patterns(&["^[0-9a-zA-Z]{2}$"])),
        CommandRule::new("lnmode", Int, Unnecessary, Constraint::IntRange(1, 3)),
        CommandRule::new("volwav", Int, Unnecessary, Constraint::IntRange(0, i64::MAX)),
        CommandRule::new("comment", String, Unnecessary, Constraint::None),
    ]
});

/// Rules of the BMS indexed header commands (`#WAVxx` and so on), in checking order.
pub static INDEXED_COMMANDS: LazyLock<Vec<CommandRule>> = LazyLock::new(|| {
    use CommandType::*;
    use Necessity::*;
    vec![
        CommandRule::new("wav", Path, Necessary, Constraint::Extensions(AUDIO_EXTS)),
        CommandRule::new("bmp", Path, Unnecessary, Constraint::Extensions(BMP_EXTS)),
        CommandRule::new(
            "bpm",
            Float,
            Unnecessary,
            Constraint::FloatRange(SMALLEST_POSITIVE, f64::MAX),
        ),
        CommandRule::new(
            "stop",
            Float,
            Unnecessary,
            Constraint::FloatRange(SMALLEST_POSITIVE, f64::MAX),
        ),
        CommandRule::new(
            "scroll",
            Float,
            Unnecessary,
            Constraint::FloatRange(-f64::MAX, f64::MAX),
        ),
    ]
});

/// Rules of the bmson `info` fields, in checking order.
#[cfg(feature = "bmson")]
pub static BMSON_INFO_FIELDS: LazyLock<Vec<CommandRule>> = LazyLock::new(|| {
    use CommandType::*;
    use Necessity::*;
    vec![
        CommandRule::new("title", String, Necessary, Constraint::None),
        CommandRule::new("subtitle", String, Unnecessary, Constraint::None),
        CommandRule::new("artist", String, SemiNecessary, Constraint::None),
        CommandRule::new("subartists", String, Unnecessary, Constraint::None),
        CommandRule::new("genre", String, SemiNecessary, Constraint::None),
        CommandRule::new(
            "mode_hint",
            String,
            SemiNecessary,
            patterns(&[
                r"^beat-\d+k$",
                r"^popn-\d+k$",
                r"^keyboard-\d+k$",
                r"generic-\d+keys$",
            ]),
        ),
        CommandRule::new("chart_name", String, Unnecessary, Constraint::None),
        CommandRule::new("level", Int, SemiNecessary, Constraint::IntRange(0, i64::MAX)),
        CommandRule::new(
            "init_bpm",
            Float,
            Necessary,
            Constraint::FloatRange(SMALLEST_POSITIVE, f64::MAX),
        ),
        CommandRule::new(
            "judge_rank",
            Float,
            SemiNecessary,
            Constraint::FloatRange(SMALLEST_POSITIVE, f64::MAX),
        ),
        CommandRule::new(
            "total",
            Float,
            SemiNecessary,
            Constraint::FloatRange(0.0, f64::MAX),
        ),
        CommandRule::new("back_image", Path, Unnecessary, Constraint::Extensions(IMAGE_EXTS)),
        CommandRule::new(
            "eyecatch_image",
            Path,
            Unnecessary,
            Constraint::Extensions(IMAGE_EXTS),
        ),
        CommandRule::new("title_image", Path, Unnecessary, Constraint::Extensions(IMAGE_EXTS)),
        CommandRule::new(
            "banner_image",
            Path,
            Unnecessary,
            Constraint::Extensions(IMAGE_EXTS),
        ),
        CommandRule::new(
            "preview_music",
            Path,
            Unnecessary,
            Constraint::Extensions(AUDIO_EXTS),
        ),
        CommandRule::new("resolution", Int, Unnecessary, Constraint::IntRange(1, i64::MAX)),
        CommandRule::new("ln_type", Int, Unnecessary, Constraint::IntRange(0, 3)),
    ]
});

/// Finds the rule of the indexed command `name`.
#[must_use]
pub fn indexed_rule(name: &str) -> Option<&'static CommandRule> {
    INDEXED_COMMANDS.iter().find(|rule| rule.name == name)
}
