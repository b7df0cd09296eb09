//! Attempt grading and history record construction.

use chrono::{DateTime, Utc};

use quiz_core::model::{
    HistoryEntry, HistoryEntryError, QuestionId, Score, ScoreBand, ScoreError, TopicFilter,
};

use crate::sessions::WorkingSet;

/// One position answered wrongly (or left unanswered) in a graded attempt.
///
/// Refers to the question by its stable id so a retry can fetch the live
/// canonical question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrongAnswerRecord {
    pub question_id: QuestionId,
    pub position: usize,
    /// Index into the answers as they were shown in the attempt.
    pub user_answer: Option<usize>,
    /// Same choice, expressed in the canonical answer order.
    pub canonical_user_answer: Option<usize>,
    /// Index of the correct answer as shown in the attempt.
    pub correct_answer: usize,
}

/// Outcome of grading a working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeResult {
    pub score: Score,
    pub total: usize,
    pub correct_count: usize,
    pub wrong: Vec<WrongAnswerRecord>,
}

impl GradeResult {
    #[must_use]
    pub fn wrong_count(&self) -> usize {
        self.wrong.len()
    }

    #[must_use]
    pub fn band(&self) -> ScoreBand {
        self.score.band()
    }

    /// Build the durable history record for this attempt.
    ///
    /// # Errors
    ///
    /// Returns `HistoryEntryError` if the counts cannot form a valid entry.
    pub fn to_history_entry(
        &self,
        timestamp: DateTime<Utc>,
        time_spent_secs: Option<u32>,
        topic: TopicFilter,
    ) -> Result<HistoryEntry, HistoryEntryError> {
        HistoryEntry::from_persisted(
            timestamp,
            self.score,
            count_u32(self.total),
            count_u32(self.correct_count),
            count_u32(self.wrong_count()),
            time_spent_secs,
            topic,
        )
    }
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Grade `answers` against `working`, position by position.
///
/// Unanswered positions count as wrong. Positions missing from `answers`
/// are treated as unanswered.
///
/// # Errors
///
/// Returns `ScoreError::NoQuestions` for an empty working set.
pub fn grade(working: &WorkingSet, answers: &[Option<usize>]) -> Result<GradeResult, ScoreError> {
    let mut correct_count = 0;
    let mut wrong = Vec::new();

    for (position, item) in working.iter().enumerate() {
        let question = item.question();
        let chosen = answers.get(position).copied().flatten();
        if chosen.is_some_and(|choice| question.is_correct(choice)) {
            correct_count += 1;
        } else {
            wrong.push(WrongAnswerRecord {
                question_id: question.id().clone(),
                position,
                user_answer: chosen,
                canonical_user_answer: chosen.and_then(|choice| item.canonical_index(choice)),
                correct_answer: question.correct_index(),
            });
        }
    }

    let score = Score::from_counts(correct_count, working.len())?;
    Ok(GradeResult {
        score,
        total: working.len(),
        correct_count,
        wrong,
    })
}
