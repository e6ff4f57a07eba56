//! Grade outcomes and the verdict decoder
//!
//! The grading model answers in free text. The expected shape is
//!
//! ```text
//! 最终评分
//! <digit>
//! <commentary...>
//! ```
//!
//! and [`decode`] turns that into a [`GradeOutcome`]. Anything that does not
//! fit the shape decodes to `Failed`; decoding never errors.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Marker the first line of a verdict must contain ("final score").
pub const FINAL_SCORE_MARKER: &str = "最终评分";

/// Ordinal quality of an answer. Variants are declared in ascending order so
/// the derived `Ord` ranks them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GradeOutcome {
    /// Below the 15K tier, or the verdict was malformed
    #[default]
    Failed,
    /// Meets the 15K tier
    Basic,
    /// Meets the 25K tier
    Intermediate,
    /// Meets the 35K tier
    Advanced,
}

impl GradeOutcome {
    /// Stable numeric code used by storage (0..=3).
    pub fn code(self) -> u8 {
        match self {
            GradeOutcome::Failed => 0,
            GradeOutcome::Basic => 1,
            GradeOutcome::Intermediate => 2,
            GradeOutcome::Advanced => 3,
        }
    }
}

impl TryFrom<u8> for GradeOutcome {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(GradeOutcome::Failed),
            1 => Ok(GradeOutcome::Basic),
            2 => Ok(GradeOutcome::Intermediate),
            3 => Ok(GradeOutcome::Advanced),
            _ => Err(format!("Unknown grade code: {}", code)),
        }
    }
}

impl FromStr for GradeOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "failed" => Ok(GradeOutcome::Failed),
            "basic" => Ok(GradeOutcome::Basic),
            "intermediate" => Ok(GradeOutcome::Intermediate),
            "advanced" => Ok(GradeOutcome::Advanced),
            _ => Err(format!("Unknown grade outcome: {}", s)),
        }
    }
}

impl std::fmt::Display for GradeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradeOutcome::Failed => write!(f, "failed"),
            GradeOutcome::Basic => write!(f, "basic"),
            GradeOutcome::Intermediate => write!(f, "intermediate"),
            GradeOutcome::Advanced => write!(f, "advanced"),
        }
    }
}

/// Decode a model verdict into a grade.
///
/// # Examples
///
/// ```
/// use examen::grading::{decode, GradeOutcome};
///
/// assert_eq!(decode("最终评分 \n 1\n..."), GradeOutcome::Basic);
/// assert_eq!(decode("no marker\n7"), GradeOutcome::Failed);
/// ```
pub fn decode(text: &str) -> GradeOutcome {
    let mut segments = text.trim().splitn(3, '\n');

    let (Some(header), Some(score_line)) = (segments.next(), segments.next()) else {
        return GradeOutcome::Failed;
    };
    if !header.contains(FINAL_SCORE_MARKER) {
        return GradeOutcome::Failed;
    }

    match score_line.trim_start().chars().next().and_then(|c| c.to_digit(10)) {
        Some(digit) => decode_score(digit as u8),
        None => GradeOutcome::Failed,
    }
}

/// Map a score byte to a grade by the position of its lowest zero bit.
///
/// The score is a bitmask of cumulative tiers: bit 0 is the 15K tier, bit 1
/// the 25K tier, bit 2 the 35K tier. Tiers only count while every lower tier
/// is also met.
pub fn decode_score(score: u8) -> GradeOutcome {
    match score.trailing_ones() {
        1 => GradeOutcome::Basic,
        2 => GradeOutcome::Intermediate,
        3 => GradeOutcome::Advanced,
        _ => GradeOutcome::Failed,
    }
}
