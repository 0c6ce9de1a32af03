//! Path string helpers.
//!
//! Charts refer files by strings written by their authors, so paths are handled as `/` separated strings rather than [`std::path::Path`]. Backslashes are treated as separators too.

/// Extension of the last path element including the dot, or an empty string.
///
/// ```rust
/// use bms_check::path::extension;
///
/// assert_eq!(extension("bgm/kick.WAV"), ".WAV");
/// assert_eq!(extension("dir.d/readme"), "");
/// ```
#[must_use]
pub fn extension(path: &str) -> &str {
    let name_start = path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    path.get(name_start..)
        .and_then(|name| name.rfind('.'))
        .and_then(|dot| path.get(name_start + dot..))
        .unwrap_or("")
}

/// Whether `path` has one of `exts`, ignoring ASCII case.
#[must_use]
pub fn has_ext(path: &str, exts: &[&str]) -> bool {
    let ext = extension(path);
    exts.iter().any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

/// `path` without its extension.
#[must_use]
pub fn strip_extension(path: &str) -> &str {
    let ext = extension(path);
    path.get(..path.len() - ext.len()).unwrap_or(path)
}

/// The last element of `path`.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Lexically normalizes `path`: unifies separators into `/`, removes `.` and empty elements, and resolves `..` where possible.
///
/// ```rust
/// use bms_check::path::clean;
///
/// assert_eq!(clean("./bga\\..\\wav//a.ogg"), "wav/a.ogg");
/// assert_eq!(clean("../a.ogg"), "../a.ogg");
/// ```
#[must_use]
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with(['/', '\\']);
    let mut elements: Vec<&str> = Vec::new();
    for element in path.split(['/', '\\']) {
        match element {
            "" | "." => {}
            ".." => match elements.last() {
                Some(&last) if last != ".." => {
                    elements.pop();
                }
                _ if rooted => {}
                _ => elements.push(".."),
            },
            _ => elements.push(element),
        }
    }
    let joined = elements.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Joins a directory and a relative path with `/`.
#[must_use]
pub fn join(dir: &str, rel: &str) -> String {
    if dir.is_empty() || dir == "." {
        rel.to_string()
    } else {
        format!("{}/{rel}", dir.trim_end_matches(['/', '\\']))
    }
}

/// Whether `text` contains characters out of ASCII, which are written differently by environments.
#[must_use]
pub const fn has_multibyte(text: &str) -> bool {
    !text.is_ascii()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn extension_of_last_element() {
        assert_eq!(extension("a.b/c"), "");
        assert_eq!(extension("a/c.tar.gz"), ".gz");
        assert_eq!(extension(".hidden"), ".hidden");
        assert_eq!(strip_extension("wav/kick.ogg"), "wav/kick");
        assert!(has_ext("KICK.OGG", &[".wav", ".ogg"]));
    }

    #[test]
    fn clean_paths() {
        assert_eq!(clean("a/./b/../c"), "a/c");
        assert_eq!(clean("./"), ".");
        assert_eq!(clean("/../a"), "/a");
        assert_eq!(file_name("a\\b/c.wav"), "c.wav");
        assert_eq!(join(".", "a.wav"), "a.wav");
        assert_eq!(join("song/", "a.wav"), "song/a.wav");
    }
}
