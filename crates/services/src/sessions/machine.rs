use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use quiz_core::model::{HistoryEntry, HistoryEntryError, TopicFilter};

use crate::error::SessionError;
use crate::grading::{GradeResult, grade};

use super::plan::{PriorAnswer, WorkingSet};
use super::progress::SessionProgress;
use super::timer::{Countdown, SessionTick, TickHandle, TickScheduler, TimerConfig};
use super::view::{
    NavItem, QuestionView, ResultView, ReviewAnswer, ReviewNavItem, ReviewStatus, ReviewView,
    TimerView, WrongAnswerDetail,
};

//
// ─── PHASES & OUTCOMES ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Setup,
    Active,
    Submitted,
    Reviewing,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setup => "in setup",
            Self::Active => "active",
            Self::Submitted => "submitted",
            Self::Reviewing => "in review",
        })
    }
}

/// How the working set of an attempt was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Fresh,
    RetryWrong,
    RetryAll,
}

impl SessionKind {
    /// Retrying wrong answers is practice and stays out of history.
    #[must_use]
    pub fn records_history(self) -> bool {
        !matches!(self, Self::RetryWrong)
    }
}

/// A working set ready to be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub working: WorkingSet,
    pub kind: SessionKind,
    pub topic: TopicFilter,
}

/// A finished attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub grade: GradeResult,
    pub kind: SessionKind,
    pub topic: TopicFilter,
    pub time_spent_secs: Option<u32>,
    pub time_expired: bool,
}

impl Submission {
    /// History record for this attempt, or `None` for attempts that are not
    /// recorded.
    ///
    /// # Errors
    ///
    /// Returns `HistoryEntryError` if the grade counts are inconsistent.
    pub fn history_entry(
        &self,
        at: DateTime<Utc>,
    ) -> Result<Option<HistoryEntry>, HistoryEntryError> {
        if !self.kind.records_history() {
            return Ok(None);
        }
        self.grade
            .to_history_entry(at, self.time_spent_secs, self.topic.clone())
            .map(Some)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Some questions are unanswered; submit again with `force` to proceed.
    ConfirmationRequired { unanswered: usize },
    Submitted(Submission),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale, untimed or not active.
    Ignored,
    Running { remaining_secs: u32 },
    Expired(Submission),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine for one quiz attempt at a time:
/// `Setup → Active → Submitted ⇄ Reviewing`, with `reset` back to `Setup`.
///
/// The session owns the tick handle of its countdown and stops it before
/// leaving `Active` or starting again. Each start bumps the attempt number;
/// ticks addressed to an older attempt are ignored.
pub struct QuizSession {
    attempt: u64,
    phase: SessionPhase,
    kind: SessionKind,
    topic: TopicFilter,
    working: WorkingSet,
    answers: Vec<Option<usize>>,
    bookmarks: BTreeSet<usize>,
    position: usize,
    countdown: Option<Countdown>,
    ticker: Option<Box<dyn TickHandle>>,
    submission: Option<Submission>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            attempt: 0,
            phase: SessionPhase::Setup,
            kind: SessionKind::Fresh,
            topic: TopicFilter::All,
            working: WorkingSet::default(),
            answers: Vec::new(),
            bookmarks: BTreeSet::new(),
            position: 0,
            countdown: None,
            ticker: None,
            submission: None,
        }
    }

    #[must_use]
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    #[must_use]
    pub fn topic(&self) -> &TopicFilter {
        &self.topic
    }

    #[must_use]
    pub fn working(&self) -> &WorkingSet {
        &self.working
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<usize> {
        self.answers.get(self.position).copied().flatten()
    }

    #[must_use]
    pub fn is_bookmarked(&self, position: usize) -> bool {
        self.bookmarks.contains(&position)
    }

    #[must_use]
    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        self.countdown.map(|c| c.remaining_secs())
    }

    #[must_use]
    pub fn timer_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    fn require(&self, action: &'static str, allowed: &[SessionPhase]) -> Result<(), SessionError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                phase: self.phase,
            })
        }
    }

    /// Begin an attempt over `plan`, starting a countdown when `timer` is set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Setup` and
    /// `SessionError::EmptySet` for an empty working set.
    pub fn start(
        &mut self,
        plan: SessionPlan,
        timer: Option<TimerConfig>,
        ticks: &dyn TickScheduler,
    ) -> Result<(), SessionError> {
        self.require("start", &[SessionPhase::Setup])?;
        if plan.working.is_empty() {
            return Err(SessionError::EmptySet);
        }

        self.stop_timer();
        self.attempt += 1;
        self.answers = vec![None; plan.working.len()];
        self.working = plan.working;
        self.kind = plan.kind;
        self.topic = plan.topic;
        self.bookmarks.clear();
        self.position = 0;
        self.submission = None;
        self.countdown = timer.map(Countdown::start);
        if timer.is_some() {
            self.ticker = Some(ticks.schedule(self.attempt));
        }
        self.phase = SessionPhase::Active;

        debug!(
            attempt = self.attempt,
            kind = ?self.kind,
            questions = self.working.len(),
            timed = self.countdown.is_some(),
            "session started"
        );
        Ok(())
    }

    /// Record `choice` for the current question without moving.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Active` and
    /// `SessionError::AnswerOutOfRange` for an index past the answers.
    pub fn select_answer(&mut self, choice: usize) -> Result<(), SessionError> {
        self.require("select an answer", &[SessionPhase::Active])?;
        let len = self
            .working
            .get(self.position)
            .map_or(0, |item| item.question().answer_count());
        if choice >= len {
            return Err(SessionError::AnswerOutOfRange { choice, len });
        }
        self.answers[self.position] = Some(choice);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless active or reviewing
    /// and `SessionError::PositionOutOfRange` past the last question.
    pub fn go_to(&mut self, position: usize) -> Result<(), SessionError> {
        self.require("navigate", &[SessionPhase::Active, SessionPhase::Reviewing])?;
        if position >= self.working.len() {
            return Err(SessionError::PositionOutOfRange {
                position,
                len: self.working.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Move forward; a no-op on the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless active or reviewing.
    pub fn next(&mut self) -> Result<(), SessionError> {
        self.require("navigate", &[SessionPhase::Active, SessionPhase::Reviewing])?;
        if self.position + 1 < self.working.len() {
            self.position += 1;
        }
        Ok(())
    }

    /// Move back; a no-op on the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless active or reviewing.
    pub fn prev(&mut self) -> Result<(), SessionError> {
        self.require("navigate", &[SessionPhase::Active, SessionPhase::Reviewing])?;
        self.position = self.position.saturating_sub(1);
        Ok(())
    }

    /// Flip the bookmark on the current question; returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Active`.
    pub fn toggle_bookmark(&mut self) -> Result<bool, SessionError> {
        self.require("bookmark", &[SessionPhase::Active])?;
        if self.bookmarks.remove(&self.position) {
            Ok(false)
        } else {
            self.bookmarks.insert(self.position);
            Ok(true)
        }
    }

    /// Apply one timer tick. Reaching zero submits without confirmation.
    ///
    /// # Errors
    ///
    /// Propagates grading failures from the forced submit.
    pub fn tick(&mut self, tick: SessionTick) -> Result<TickOutcome, SessionError> {
        if tick.session != self.attempt || self.phase != SessionPhase::Active {
            return Ok(TickOutcome::Ignored);
        }
        let Some(countdown) = self.countdown.as_mut() else {
            return Ok(TickOutcome::Ignored);
        };

        if countdown.tick() {
            info!(attempt = self.attempt, "time expired");
            return self.finish(true).map(TickOutcome::Expired);
        }
        Ok(TickOutcome::Running {
            remaining_secs: countdown.remaining_secs(),
        })
    }

    /// Grade the attempt.
    ///
    /// With unanswered questions and `force == false` nothing changes and
    /// `SubmitOutcome::ConfirmationRequired` is returned.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Active`.
    pub fn submit(&mut self, force: bool) -> Result<SubmitOutcome, SessionError> {
        self.require("submit", &[SessionPhase::Active])?;
        let unanswered = self.answers.iter().filter(|a| a.is_none()).count();
        if unanswered > 0 && !force {
            return Ok(SubmitOutcome::ConfirmationRequired { unanswered });
        }
        self.finish(false).map(SubmitOutcome::Submitted)
    }

    fn finish(&mut self, time_expired: bool) -> Result<Submission, SessionError> {
        let grade = grade(&self.working, &self.answers)?;
        self.stop_timer();

        let submission = Submission {
            grade,
            kind: self.kind,
            topic: self.topic.clone(),
            time_spent_secs: self.countdown.map(|c| c.elapsed_secs()),
            time_expired,
        };
        info!(
            attempt = self.attempt,
            score = %submission.grade.score,
            correct = submission.grade.correct_count,
            total = submission.grade.total,
            "attempt submitted"
        );
        self.submission = Some(submission.clone());
        self.phase = SessionPhase::Submitted;
        Ok(submission)
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless submitted.
    pub fn enter_review(&mut self) -> Result<(), SessionError> {
        self.require("enter review", &[SessionPhase::Submitted])?;
        self.position = 0;
        self.phase = SessionPhase::Reviewing;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless reviewing.
    pub fn exit_review(&mut self) -> Result<(), SessionError> {
        self.require("exit review", &[SessionPhase::Reviewing])?;
        self.phase = SessionPhase::Submitted;
        Ok(())
    }

    /// Stop any countdown and discard the attempt, returning to `Setup`.
    pub fn reset(&mut self) {
        self.stop_timer();
        if self.phase != SessionPhase::Setup {
            debug!(attempt = self.attempt, phase = %self.phase, "session reset");
        }
        self.phase = SessionPhase::Setup;
        self.kind = SessionKind::Fresh;
        self.topic = TopicFilter::All;
        self.working = WorkingSet::default();
        self.answers.clear();
        self.bookmarks.clear();
        self.position = 0;
        self.countdown = None;
        self.submission = None;
    }

    /// Cancel the tick source, if any. Safe to call repeatedly.
    pub fn stop_timer(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    //
    // ─── VIEWS ─────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let answered = self.answers.iter().filter(|a| a.is_some()).count();
        SessionProgress::new(self.position, self.working.len(), answered)
    }

    /// Current question of an active attempt.
    #[must_use]
    pub fn question_view(&self) -> Option<QuestionView> {
        if self.phase != SessionPhase::Active {
            return None;
        }
        let item = self.working.get(self.position)?;
        let question = item.question();
        let last = self.working.len() - 1;

        Some(QuestionView {
            question_id: question.id().clone(),
            text: question.text().to_string(),
            answers: question.answers().to_vec(),
            topic: question.topic().map(str::to_string),
            selected: self.current_answer(),
            bookmarked: self.is_bookmarked(self.position),
            prior_answer: item.prior_answer().map(|prior| match prior {
                PriorAnswer::Chosen(_) => item.prior_answer_text().map(str::to_string),
                PriorAnswer::Unanswered => None,
            }),
            is_first: self.position == 0,
            is_last: self.position == last,
            progress: self.progress(),
            nav: (0..self.working.len())
                .map(|position| NavItem {
                    position,
                    answered: self.answers[position].is_some(),
                    current: position == self.position,
                    bookmarked: self.is_bookmarked(position),
                })
                .collect(),
            timer: self.countdown.map(|c| TimerView {
                remaining_secs: c.remaining_secs(),
                limit_secs: c.limit_secs(),
                low_time: c.is_low(),
            }),
        })
    }

    fn status_at(&self, position: usize) -> ReviewStatus {
        let correct = self
            .working
            .get(position)
            .map_or(0, |item| item.question().correct_index());
        ReviewStatus::from_answer(self.answers.get(position).copied().flatten(), correct)
    }

    /// Graded question at the current position while reviewing.
    #[must_use]
    pub fn review_view(&self) -> Option<ReviewView> {
        if self.phase != SessionPhase::Reviewing {
            return None;
        }
        let question = self.working.get(self.position)?.question();
        let chosen = self.current_answer();

        Some(ReviewView {
            position: self.position,
            total: self.working.len(),
            text: question.text().to_string(),
            answers: question
                .answers()
                .iter()
                .enumerate()
                .map(|(idx, text)| ReviewAnswer {
                    text: text.clone(),
                    is_correct: question.is_correct(idx),
                    is_user_choice: chosen == Some(idx),
                })
                .collect(),
            status: self.status_at(self.position),
            explanation: question.explanation().map(str::to_string),
            is_first: self.position == 0,
            is_last: self.position + 1 == self.working.len(),
            strip: (0..self.working.len())
                .map(|position| ReviewNavItem {
                    position,
                    status: self.status_at(position),
                    current: position == self.position,
                })
                .collect(),
        })
    }

    /// Score summary once the attempt has been graded.
    #[must_use]
    pub fn result_view(&self) -> Option<ResultView> {
        let submission = self.submission.as_ref()?;
        let grade = &submission.grade;

        let wrong_answers = grade
            .wrong
            .iter()
            .filter_map(|record| {
                let question = self.working.get(record.position)?.question();
                Some(WrongAnswerDetail {
                    position: record.position,
                    question_id: record.question_id.clone(),
                    question_text: question.text().to_string(),
                    user_answer: record
                        .user_answer
                        .and_then(|idx| question.answer(idx))
                        .map(str::to_string),
                    correct_answer: question.correct_answer().to_string(),
                })
            })
            .collect();

        Some(ResultView {
            score: grade.score,
            band: grade.band(),
            message: grade.band().message(),
            total: grade.total,
            correct: grade.correct_count,
            wrong: grade.wrong_count(),
            wrong_answers,
            can_retry_wrong: !grade.wrong.is_empty(),
            time_expired: submission.time_expired,
            time_spent_secs: submission.time_spent_secs,
        })
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("attempt", &self.attempt)
            .field("phase", &self.phase)
            .field("kind", &self.kind)
            .field("topic", &self.topic)
            .field("questions", &self.working.len())
            .field("position", &self.position)
            .field("countdown", &self.countdown)
            .field("timer_running", &self.timer_running())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
