//! Plain render data handed to the presentation layer.

use quiz_core::model::{QuestionId, Score, ScoreBand};

use super::progress::SessionProgress;

/// One cell of the question navigation strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub position: usize,
    pub answered: bool,
    pub current: bool,
    pub bookmarked: bool,
}

/// Countdown state for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerView {
    pub remaining_secs: u32,
    pub limit_secs: u32,
    pub low_time: bool,
}

/// Everything needed to draw the current question of an active attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub question_id: QuestionId,
    pub text: String,
    pub answers: Vec<String>,
    pub topic: Option<String>,
    pub selected: Option<usize>,
    pub bookmarked: bool,
    /// Prior answer text when replaying wrong answers; `Some(None)` means the
    /// question was left unanswered last time.
    pub prior_answer: Option<Option<String>>,
    pub is_first: bool,
    pub is_last: bool,
    pub progress: SessionProgress,
    pub nav: Vec<NavItem>,
    pub timer: Option<TimerView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Correct,
    Incorrect,
    Unanswered,
}

impl ReviewStatus {
    #[must_use]
    pub fn from_answer(chosen: Option<usize>, correct_index: usize) -> Self {
        match chosen {
            None => Self::Unanswered,
            Some(choice) if choice == correct_index => Self::Correct,
            Some(_) => Self::Incorrect,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewAnswer {
    pub text: String,
    pub is_correct: bool,
    pub is_user_choice: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewNavItem {
    pub position: usize,
    pub status: ReviewStatus,
    pub current: bool,
}

/// A graded question shown in review mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewView {
    pub position: usize,
    pub total: usize,
    pub text: String,
    pub answers: Vec<ReviewAnswer>,
    pub status: ReviewStatus,
    pub explanation: Option<String>,
    pub is_first: bool,
    pub is_last: bool,
    pub strip: Vec<ReviewNavItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrongAnswerDetail {
    pub position: usize,
    pub question_id: QuestionId,
    pub question_text: String,
    /// `None` when the question was left unanswered.
    pub user_answer: Option<String>,
    pub correct_answer: String,
}

/// Summary of a graded attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub score: Score,
    pub band: ScoreBand,
    pub message: &'static str,
    pub total: usize,
    pub correct: usize,
    pub wrong: usize,
    pub wrong_answers: Vec<WrongAnswerDetail>,
    pub can_retry_wrong: bool,
    pub time_expired: bool,
    pub time_spent_secs: Option<u32>,
}
