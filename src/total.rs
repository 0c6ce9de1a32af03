//! Plausibility of the gauge total.

/// Expected total of a chart with `total_notes` notes.
///
/// ```rust
/// use bms_check::total::default_total;
///
/// assert_eq!(default_total(0, 7), 260.0);
/// assert_eq!(default_total(0, 24), 300.0);
/// ```
#[must_use]
pub fn default_total(total_notes: usize, keymode: u32) -> f64 {
    let n = total_notes as f64;
    if keymode >= 24 {
        (7.605 * (n + 100.0) / (0.01 * n + 6.5)).max(300.0)
    } else {
        (7.605 * n / (0.01 * n + 6.5)).max(260.0)
    }
}

/// How far a total is from the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TotalJudge {
    /// Much higher than expected.
    High,
    /// Within the expectation.
    Normal,
    /// Much lower than expected.
    Low,
}

const RATE: f64 = 1.6;
const HIGH_TOTAL_PER_NOTE: f64 = 0.35;
const LOW_TOTAL_PER_NOTE: f64 = 0.2;

/// Judges `total` against [`default_total`]. It is [`TotalJudge::Normal`] when the chart has no notes.
#[must_use]
pub fn judge_total(total: f64, total_notes: usize, keymode: u32) -> TotalJudge {
    if total_notes == 0 {
        return TotalJudge::Normal;
    }
    let expected = default_total(total_notes, keymode);
    let per_note = total / total_notes as f64;
    if total > expected * RATE && per_note > HIGH_TOTAL_PER_NOTE {
        TotalJudge::High
    } else if total < expected / RATE && per_note < LOW_TOTAL_PER_NOTE {
        TotalJudge::Low
    } else {
        TotalJudge::Normal
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn judges() {
        assert_eq!(judge_total(300.0, 1000, 7), TotalJudge::Normal);
        assert_eq!(judge_total(1000.0, 1000, 7), TotalJudge::High);
        assert_eq!(judge_total(100.0, 1000, 7), TotalJudge::Low);
        assert_eq!(judge_total(100.0, 0, 7), TotalJudge::Normal);
    }
}
