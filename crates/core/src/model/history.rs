use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::score::{HistoryFilter, Score};
use crate::model::topic::TopicFilter;

/// Maximum number of attempts kept in history.
pub const HISTORY_CAP: usize = 50;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HistoryEntryError {
    #[error("history entry has no questions")]
    NoQuestions,

    #[error("total questions ({total}) does not match correct + wrong ({sum})")]
    CountMismatch { total: u32, sum: u32 },
}

/// Immutable record of one graded attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    timestamp: DateTime<Utc>,
    score: Score,
    total_questions: u32,
    correct_count: u32,
    wrong_count: u32,
    time_spent_secs: Option<u32>,
    topic: TopicFilter,
}

impl HistoryEntry {
    /// Build or rehydrate a history entry.
    ///
    /// # Errors
    ///
    /// Returns `HistoryEntryError::NoQuestions` for an empty attempt and
    /// `HistoryEntryError::CountMismatch` if the counts do not add up.
    pub fn from_persisted(
        timestamp: DateTime<Utc>,
        score: Score,
        total_questions: u32,
        correct_count: u32,
        wrong_count: u32,
        time_spent_secs: Option<u32>,
        topic: TopicFilter,
    ) -> Result<Self, HistoryEntryError> {
        if total_questions == 0 {
            return Err(HistoryEntryError::NoQuestions);
        }
        let sum = correct_count.saturating_add(wrong_count);
        if sum != total_questions {
            return Err(HistoryEntryError::CountMismatch {
                total: total_questions,
                sum,
            });
        }

        Ok(Self {
            timestamp,
            score,
            total_questions,
            correct_count,
            wrong_count,
            time_spent_secs,
            topic,
        })
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> Option<u32> {
        self.time_spent_secs
    }

    #[must_use]
    pub fn topic(&self) -> &TopicFilter {
        &self.topic
    }
}

/// Newest-first, capped log of attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from entries already ordered newest-first.
    #[must_use]
    pub fn from_entries(mut entries: Vec<HistoryEntry>) -> Self {
        entries.truncate(HISTORY_CAP);
        Self { entries }
    }

    /// Prepend an entry, dropping the oldest ones beyond the cap.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);
    }

    #[must_use]
    pub fn filter(&self, filter: HistoryFilter) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|entry| filter.matches(entry.score()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn entry(hundredths: u32, total: u32, correct: u32) -> HistoryEntry {
        HistoryEntry::from_persisted(
            fixed_now(),
            Score::from_hundredths(hundredths).unwrap(),
            total,
            correct,
            total - correct,
            None,
            TopicFilter::All,
        )
        .unwrap()
    }

    #[test]
    fn entry_rejects_mismatched_counts() {
        let err = HistoryEntry::from_persisted(
            fixed_now(),
            Score::from_hundredths(500).unwrap(),
            4,
            2,
            1,
            None,
            TopicFilter::All,
        )
        .unwrap_err();
        assert_eq!(err, HistoryEntryError::CountMismatch { total: 4, sum: 3 });
    }

    #[test]
    fn log_is_newest_first_and_capped() {
        let mut log = HistoryLog::new();
        for correct in 0..=60_u32 {
            log.push(entry(correct * 10, 100, correct));
        }

        assert_eq!(log.len(), HISTORY_CAP);
        assert_eq!(log.entries()[0].correct_count(), 60);
        assert_eq!(log.entries()[HISTORY_CAP - 1].correct_count(), 11);
    }

    #[test]
    fn from_entries_truncates_to_cap() {
        let entries = (0..70).map(|_| entry(500, 2, 1)).collect();
        assert_eq!(HistoryLog::from_entries(entries).len(), HISTORY_CAP);
    }

    #[test]
    fn filter_preserves_order_by_band() {
        let mut log = HistoryLog::new();
        log.push(entry(900, 10, 9));
        log.push(entry(700, 10, 7));
        log.push(entry(850, 20, 17));
        log.push(entry(300, 10, 3));

        let excellent = log.filter(HistoryFilter::Excellent);
        assert_eq!(excellent.len(), 2);
        assert_eq!(excellent[0].total_questions(), 20);
        assert_eq!(excellent[1].total_questions(), 10);

        assert_eq!(log.filter(HistoryFilter::Good).len(), 1);
        assert!(log.filter(HistoryFilter::Average).is_empty());
        assert_eq!(log.filter(HistoryFilter::All).len(), 4);

        log.clear();
        assert!(log.is_empty());
    }
}
