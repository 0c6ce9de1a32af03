//! Services provided by the caller.
//!
//! The checkers never touch the file system or decode audio. Instead they ask these traits, so that a driver can plug real implementations and tests can plug fakes.

/// Detects whether bytes of a chart are encoded in UTF-8.
pub trait CharsetDetector {
    /// Returns `true` if `bytes` look like UTF-8 text.
    fn is_utf8(&self, bytes: &[u8]) -> bool;
}

impl<F: Fn(&[u8]) -> bool> CharsetDetector for F {
    fn is_utf8(&self, bytes: &[u8]) -> bool {
        self(bytes)
    }
}

/// Bytes of the UTF-8 byte order mark.
pub const UTF8_BOM: &[u8] = &[0xef, 0xbb, 0xbf];

/// The default [`CharsetDetector`].
///
/// Bytes are UTF-8 if they start with the byte order mark, or if they are valid UTF-8 and contain any non-ASCII byte. Pure ASCII is not regarded as UTF-8 because it is also valid Shift_JIS.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Detector;

impl CharsetDetector for Utf8Detector {
    fn is_utf8(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(UTF8_BOM) || (!bytes.is_ascii() && std::str::from_utf8(bytes).is_ok())
    }
}

/// Probes the playing length of audio files.
pub trait AudioProbe {
    /// Returns the duration in seconds of the audio file at `path`, or `None` if it cannot be decoded.
    fn duration(&self, path: &str) -> Option<f64>;
}

impl<F: Fn(&str) -> Option<f64>> AudioProbe for F {
    fn duration(&self, path: &str) -> Option<f64> {
        self(path)
    }
}

/// An [`AudioProbe`] which knows nothing, so the audio length check is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAudioProbe;

impl AudioProbe for NoAudioProbe {
    fn duration(&self, _path: &str) -> Option<f64> {
        None
    }
}
