//! Channel tables.
//!
//! Channels are handled as lowercase two characters strings, such as `11` or `sc`.

use super::obj::ObjType;

/// Background sound.
pub const BGM: &str = "01";
/// Measure length override.
pub const MEASURE_LENGTH: &str = "02";
/// Inline BPM change in hexadecimal.
pub const BPM: &str = "03";
/// BPM change by `#BPMxx`.
pub const EXTENDED_BPM: &str = "08";
/// Stop by `#STOPxx`.
pub const STOP: &str = "09";
/// Scroll speed change by `#SCROLLxx`.
pub const SCROLL: &str = "sc";

fn split(channel: &str) -> Option<(u8, u8)> {
    match channel.as_bytes() {
        &[family, lane] => Some((family, lane)),
        _ => None,
    }
}

fn in_families(channel: &str, families: &[u8]) -> bool {
    split(channel).is_some_and(|(family, lane)| families.contains(&family) && (b'1'..=b'9').contains(&lane))
}

/// Background animation channels `04`, `06` and `07`.
#[must_use]
pub fn is_bmp(channel: &str) -> bool {
    matches!(channel, "04" | "06" | "07")
}

/// Visible notes `11`-`19` and `21`-`29`.
#[must_use]
pub fn is_normal_note(channel: &str) -> bool {
    in_families(channel, b"12")
}

/// Invisible notes `31`-`39` and `41`-`49`.
#[must_use]
pub fn is_invisible_note(channel: &str) -> bool {
    in_families(channel, b"34")
}

/// Long notes `51`-`59` and `61`-`69`.
#[must_use]
pub fn is_ln(channel: &str) -> bool {
    in_families(channel, b"56")
}

/// Playable notes, visible or long.
#[must_use]
pub fn is_note(channel: &str) -> bool {
    is_normal_note(channel) || is_ln(channel)
}

/// Channels whose objects refer `#WAVxx`, except mines.
#[must_use]
pub fn is_wav(channel: &str) -> bool {
    channel == BGM || is_normal_note(channel) || is_invisible_note(channel) || is_ln(channel)
}

/// Mines `d1`-`d9` and `e1`-`e9`.
#[must_use]
pub fn is_mine(channel: &str) -> bool {
    in_families(channel, b"de")
}

/// The object type placed on `channel`, or `None` for unknown channels and the measure length channel.
#[must_use]
pub fn obj_type(channel: &str) -> Option<ObjType> {
    if is_wav(channel) {
        Some(ObjType::Wav)
    } else if is_bmp(channel) {
        Some(ObjType::Bmp)
    } else if is_mine(channel) {
        Some(ObjType::Mine)
    } else {
        match channel {
            BPM => Some(ObjType::Bpm),
            EXTENDED_BPM => Some(ObjType::ExtendedBpm),
            STOP => Some(ObjType::Stop),
            SCROLL => Some(ObjType::Scroll),
            _ => None,
        }
    }
}

/// The channel as a decimal number, or 0 if it is not decimal.
#[must_use]
pub fn number(channel: &str) -> u32 {
    channel.parse().unwrap_or(0)
}

/// Lane index 0-19 of a note or mine channel. The second player side and mines on it are shifted by 10.
#[must_use]
pub fn lane(channel: &str) -> usize {
    let Some((family, lane)) = split(channel) else {
        return 0;
    };
    let base = if lane.is_ascii_digit() {
        usize::from(lane - b'0')
    } else {
        0
    };
    match family {
        b'2' | b'4' | b'6' | b'e' => base + 10,
        _ => base,
    }
}

/// The long note channel paired with a normal note channel or a mine channel, such as `51` for `11` or `d1`.
#[must_use]
pub fn paired_ln(channel: &str) -> Option<String> {
    let (family, lane) = split(channel)?;
    let ln_family = match family {
        b'1' | b'd' => '5',
        b'2' | b'e' => '6',
        _ => return None,
    };
    Some(format!("{ln_family}{}", char::from(lane)))
}
