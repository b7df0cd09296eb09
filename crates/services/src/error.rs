//! Shared error types for the services crate.

use std::fmt;

use thiserror::Error;

use quiz_core::model::{HistoryEntryError, QuestionError, ScoreError, SettingsError};
use storage::repository::StorageError;

use crate::sessions::SessionPhase;

/// How many per-record messages an import error summary shows.
pub const REPORTED_VALIDATION_MESSAGES: usize = 3;

/// Per-record problems found while validating an import document.
///
/// Holds one message per offending record; `Display` shows the total count
/// and the first few messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    messages: Vec<String>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid question(s)", self.messages.len())?;
        for message in self.messages.iter().take(REPORTED_VALIDATION_MESSAGES) {
            write!(f, "\n{message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors emitted while importing a question document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("import document is too large ({bytes} bytes, max {max})")]
    TooLarge { bytes: usize, max: usize },
    #[error("import document is not valid JSON: {0}")]
    Malformed(String),
    #[error("import document has no questions")]
    MissingQuestions,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

/// Errors emitted by session building and the session state machine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    EmptySet,
    #[error("none of the wrong questions could be found for retry")]
    EmptyRetrySet,
    #[error("no question set has been loaded")]
    NoQuestionsLoaded,
    #[error("no graded attempt is available")]
    NoResult,
    #[error("cannot {action} while the session is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: SessionPhase,
    },
    #[error("answer {choice} is out of range for {len} answers")]
    AnswerOutOfRange { choice: usize, len: usize },
    #[error("position {position} is out of range for {len} questions")]
    PositionOutOfRange { position: usize, len: usize },
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Score(#[from] ScoreError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while rendering history exports.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    #[error("there is no history to export")]
    Empty,
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("export buffer error: {0}")]
    Buffer(String),
}

/// Errors emitted by `HistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryServiceError {
    #[error(transparent)]
    Entry(#[from] HistoryEntryError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors surfaced through the `QuizApp` command surface.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizAppError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Settings(#[from] SettingsServiceError),
    #[error(transparent)]
    History(#[from] HistoryServiceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_summary_shows_count_and_first_three() {
        let errors = ValidationErrors::new(
            (1..=5)
                .map(|n| format!("question {n}: question text is missing or empty"))
                .collect(),
        );
        let text = errors.to_string();

        assert!(text.starts_with("5 invalid question(s)"));
        assert!(text.contains("question 3:"));
        assert!(!text.contains("question 4:"));
        assert_eq!(errors.messages().len(), 5);
    }
}
