use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("cannot score an attempt with no questions")]
    NoQuestions,

    #[error("correct count {correct} exceeds total {total}")]
    CountMismatch { correct: usize, total: usize },

    #[error("score must be between 0 and 10")]
    OutOfRange,
}

/// Attempt score on a 0–10 scale, kept in hundredths so that two-decimal
/// rounding is exact and comparisons against band thresholds never drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u16);

impl Score {
    pub const MAX_HUNDREDTHS: u16 = 1000;

    /// Score for `correct` out of `total`, rounded half-up to two decimals.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::NoQuestions` for an empty attempt and
    /// `ScoreError::CountMismatch` if `correct > total`.
    pub fn from_counts(correct: usize, total: usize) -> Result<Self, ScoreError> {
        if total == 0 {
            return Err(ScoreError::NoQuestions);
        }
        if correct > total {
            return Err(ScoreError::CountMismatch { correct, total });
        }
        let correct = correct as u64;
        let total = total as u64;
        let hundredths = (correct * 2000 + total) / (2 * total);
        Self::from_hundredths(u32::try_from(hundredths).map_err(|_| ScoreError::OutOfRange)?)
    }

    /// # Errors
    ///
    /// Returns `ScoreError::OutOfRange` above 10.00.
    pub fn from_hundredths(hundredths: u32) -> Result<Self, ScoreError> {
        u16::try_from(hundredths)
            .ok()
            .filter(|h| *h <= Self::MAX_HUNDREDTHS)
            .map(Self)
            .ok_or(ScoreError::OutOfRange)
    }

    #[must_use]
    pub fn hundredths(self) -> u16 {
        self.0
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    #[must_use]
    pub fn band(self) -> ScoreBand {
        ScoreBand::from_score(self)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

//
// ─── BANDS ─────────────────────────────────────────────────────────────────────
//

/// Qualitative band used for result messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreBand {
    /// 8.00 and above.
    Excellent,
    /// From 6.50 up to 8.00.
    Good,
    /// From 5.00 up to 6.50.
    Average,
    /// Below 5.00.
    NeedsImprovement,
}

impl ScoreBand {
    #[must_use]
    pub fn from_score(score: Score) -> Self {
        match score.hundredths() {
            800.. => Self::Excellent,
            650.. => Self::Good,
            500.. => Self::Average,
            _ => Self::NeedsImprovement,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent!",
            Self::Good => "Good job!",
            Self::Average => "Average",
            Self::NeedsImprovement => "Keep trying!",
        }
    }
}

/// History filter by score band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HistoryFilter {
    #[default]
    All,
    Excellent,
    Good,
    Average,
}

impl HistoryFilter {
    #[must_use]
    pub fn matches(self, score: Score) -> bool {
        match self {
            Self::All => true,
            Self::Excellent => score.band() == ScoreBand::Excellent,
            Self::Good => score.band() == ScoreBand::Good,
            Self::Average => score.band() == ScoreBand::Average,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Average => "average",
        }
    }
}

/// Error type for parsing a history filter key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown history filter: {0}")]
pub struct ParseHistoryFilterError(String);

impl FromStr for HistoryFilter {
    type Err = ParseHistoryFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "excellent" => Ok(Self::Excellent),
            "good" => Ok(Self::Good),
            "average" => Ok(Self::Average),
            _ => Err(ParseHistoryFilterError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_rounds_to_two_decimals() {
        assert_eq!(Score::from_counts(1, 2).unwrap().to_string(), "5.00");
        assert_eq!(Score::from_counts(1, 3).unwrap().to_string(), "3.33");
        assert_eq!(Score::from_counts(2, 3).unwrap().to_string(), "6.67");
        assert_eq!(Score::from_counts(0, 7).unwrap().to_string(), "0.00");
        assert_eq!(Score::from_counts(7, 7).unwrap().to_string(), "10.00");
    }

    #[test]
    fn empty_attempt_cannot_be_scored() {
        assert_eq!(Score::from_counts(0, 0), Err(ScoreError::NoQuestions));
        assert!(Score::from_counts(3, 2).is_err());
    }

    #[test]
    fn bands_follow_thresholds() {
        let band = |h| Score::from_hundredths(h).unwrap().band();
        assert_eq!(band(1000), ScoreBand::Excellent);
        assert_eq!(band(800), ScoreBand::Excellent);
        assert_eq!(band(799), ScoreBand::Good);
        assert_eq!(band(650), ScoreBand::Good);
        assert_eq!(band(649), ScoreBand::Average);
        assert_eq!(band(500), ScoreBand::Average);
        assert_eq!(band(499), ScoreBand::NeedsImprovement);
    }

    #[test]
    fn filter_excludes_low_scores_from_named_bands() {
        let low = Score::from_hundredths(120).unwrap();
        assert!(HistoryFilter::All.matches(low));
        assert!(!HistoryFilter::Average.matches(low));
        assert!(!HistoryFilter::Good.matches(low));
        assert!(!HistoryFilter::Excellent.matches(low));
    }

    #[test]
    fn filter_parses_keys() {
        assert_eq!("Good".parse::<HistoryFilter>().unwrap(), HistoryFilter::Good);
        assert!("great".parse::<HistoryFilter>().is_err());
    }

    #[test]
    fn score_serializes_as_number() {
        let score = Score::from_counts(1, 2).unwrap();
        assert_eq!(serde_json::to_string(&score).unwrap(), "5.0");
        let score = Score::from_counts(2, 3).unwrap();
        assert_eq!(serde_json::to_string(&score).unwrap(), "6.67");
    }
}
