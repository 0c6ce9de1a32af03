//! Check results.
//!
//! Every finding of the checkers is reduced into a [`Log`], which has a severity [`Level`], an English message, a Japanese message, and optional sub logs. The order of logs in [`Logs`] is the display order.

use std::{
    fmt,
    ops::{Deref, DerefMut},
};

/// Severity of a [`Log`]. It is only used to sort out the output, never to stop checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    /// The chart is broken or will be played wrongly.
    Error,
    /// The chart is playable but should be fixed.
    Warning,
    /// For information.
    Notice,
}

impl Level {
    /// Label of the level for rendering, such as `ERROR`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How sub logs of a [`Log`] are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubLogType {
    /// Each sub log is rendered as a variant of the full message: `LEVEL: message: sub`.
    #[default]
    List,
    /// The message is rendered once, and each sub log follows it on an indented line.
    Detail,
}

/// Language to render logs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lang {
    /// English.
    #[default]
    En,
    /// Japanese.
    Ja,
}

impl std::str::FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "ja" => Ok(Self::Ja),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

/// A finding of the checkers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Log {
    /// Severity of the finding.
    pub level: Level,
    /// Message in English.
    pub message: String,
    /// Message in Japanese.
    pub message_ja: String,
    /// Items attached to the message.
    pub sub_logs: Vec<String>,
    /// Rendering style of `sub_logs`.
    pub sub_log_type: SubLogType,
}

impl Log {
    /// Creates a new log without sub logs.
    pub fn new(level: Level, message: impl Into<String>, message_ja: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            message_ja: message_ja.into(),
            sub_logs: Vec::new(),
            sub_log_type: SubLogType::default(),
        }
    }

    /// Creates a new [`Level::Error`] log.
    pub fn error(message: impl Into<String>, message_ja: impl Into<String>) -> Self {
        Self::new(Level::Error, message, message_ja)
    }

    /// Creates a new [`Level::Warning`] log.
    pub fn warning(message: impl Into<String>, message_ja: impl Into<String>) -> Self {
        Self::new(Level::Warning, message, message_ja)
    }

    /// Creates a new [`Level::Notice`] log.
    pub fn notice(message: impl Into<String>, message_ja: impl Into<String>) -> Self {
        Self::new(Level::Notice, message, message_ja)
    }

    /// Attaches sub logs rendered as [`SubLogType::List`].
    #[must_use]
    pub fn with_list<S: Into<String>>(mut self, items: impl IntoIterator<Item = S>) -> Self {
        self.sub_logs = items.into_iter().map(Into::into).collect();
        self.sub_log_type = SubLogType::List;
        self
    }

    /// Attaches sub logs rendered as [`SubLogType::Detail`].
    #[must_use]
    pub fn with_detail<S: Into<String>>(mut self, items: impl IntoIterator<Item = S>) -> Self {
        self.sub_logs = items.into_iter().map(Into::into).collect();
        self.sub_log_type = SubLogType::Detail;
        self
    }

    /// The message in `lang`. Falls back to English if there is no Japanese one.
    #[must_use]
    pub fn message(&self, lang: Lang) -> &str {
        match lang {
            Lang::Ja if !self.message_ja.is_empty() => &self.message_ja,
            _ => &self.message,
        }
    }

    /// Renders the log in `lang`.
    #[must_use]
    pub fn render(&self, lang: Lang) -> String {
        let head = format!("{}: {}", self.level, self.message(lang));
        match self.sub_log_type {
            SubLogType::List if !self.sub_logs.is_empty() => self
                .sub_logs
                .iter()
                .map(|sub| format!("{head}: {sub}"))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => {
                let mut out = head;
                for sub in &self.sub_logs {
                    out.push_str("\n  ");
                    out.push_str(sub);
                }
                out
            }
        }
    }
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Lang::En))
    }
}

/// Ordered logs owned by a file or directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Logs(pub Vec<Log>);

impl Logs {
    /// Creates empty logs.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Renders all logs in `lang`, joined by newlines.
    #[must_use]
    pub fn render(&self, lang: Lang) -> String {
        self.0
            .iter()
            .map(|log| log.render(lang))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Counts logs of `level`.
    #[must_use]
    pub fn count(&self, level: Level) -> usize {
        self.0.iter().filter(|log| log.level == level).count()
    }
}

impl Deref for Logs {
    type Target = Vec<Log>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Logs {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Extend<Log> for Logs {
    fn extend<T: IntoIterator<Item = Log>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<Log> for Logs {
    fn from_iter<T: IntoIterator<Item = Log>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Logs {
    type Item = Log;
    type IntoIter = std::vec::IntoIter<Log>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Logs {
    type Item = &'a Log;
    type IntoIter = std::slice::Iter<'a, Log>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Logs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Lang::En))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn render_plain() {
        let log = Log::error("TotalNotes is 0", "トータルノーツ数が0です");
        assert_eq!(log.render(Lang::En), "ERROR: TotalNotes is 0");
        assert_eq!(log.render(Lang::Ja), "ERROR: トータルノーツ数が0です");
    }

    #[test]
    fn render_list_repeats_message() {
        let log = Log::warning("Placed WAV object is undefined", "")
            .with_list(["0A", "0B"]);
        assert_eq!(
            log.render(Lang::Ja),
            "WARNING: Placed WAV object is undefined: 0A\nWARNING: Placed WAV object is undefined: 0B"
        );
    }

    #[test]
    fn render_detail_indents() {
        let log = Log::warning("These bmsfiles are same", "").with_detail(["a.bms", "b.bms"]);
        assert_eq!(
            log.render(Lang::En),
            "WARNING: These bmsfiles are same\n  a.bms\n  b.bms"
        );
    }

    #[test]
    fn logs_join_with_newline() {
        let logs: Logs = [
            Log::notice("a", "あ"),
            Log::warning("b", "い"),
        ]
        .into_iter()
        .collect();
        assert_eq!(logs.render(Lang::En), "NOTICE: a\nWARNING: b");
        assert_eq!(logs.count(Level::Warning), 1);
    }
}
