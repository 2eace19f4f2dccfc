use std::sync::LazyLock;

use regex::Regex;

static INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+").unwrap());

pub const MAX_HOURS: usize = 12;
pub const MAX_SCORE: u8 = 10;

/// Pull up to 12 hourly bite scores (0..=10) out of a loosely formatted line.
///
/// Every integer token counts, whatever separates them. A `-` glued to a
/// digit run makes it negative, so `-3` is rejected rather than read as `3`.
/// Out-of-range and overflowing tokens are skipped, not clamped.
pub fn extract_scores(line: &str) -> Vec<u8> {
    INT_RE
        .find_iter(line)
        .filter_map(|m| m.as_str().parse::<i64>().ok())
        .filter(|v| (0..=MAX_SCORE as i64).contains(v))
        .map(|v| v as u8)
        .take(MAX_HOURS)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiteBand {
    Peak,
    Active,
    Low,
}

impl BiteBand {
    pub fn of(score: u8) -> Self {
        match score {
            8..=u8::MAX => BiteBand::Peak,
            5..=7 => BiteBand::Active,
            _ => BiteBand::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BiteBand::Peak => "Peak",
            BiteBand::Active => "Active",
            BiteBand::Low => "Low",
        }
    }
}
