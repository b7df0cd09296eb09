use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is missing or empty")]
    EmptyText,

    #[error("at least 2 answers are required (found {found})")]
    TooFewAnswers { found: usize },

    #[error("correct answer index {index} is out of range for {len} answers")]
    CorrectIndexOutOfRange { index: i64, len: usize },

    #[error("answer order is not a permutation of {len} answers")]
    InvalidAnswerOrder { len: usize },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as read from an import document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionDraft {
    pub id: Option<QuestionId>,
    pub text: String,
    pub answers: Vec<String>,
    pub correct_index: i64,
    pub topic: Option<String>,
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into a `Question`.
    ///
    /// A missing id is replaced with a generated one.
    ///
    /// # Errors
    ///
    /// Returns the first `QuestionError` found: empty text, fewer than two
    /// answers, or a correct index outside the answer bounds.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }

        if self.answers.len() < 2 {
            return Err(QuestionError::TooFewAnswers {
                found: self.answers.len(),
            });
        }

        let correct_index = usize::try_from(self.correct_index)
            .ok()
            .filter(|idx| *idx < self.answers.len())
            .ok_or(QuestionError::CorrectIndexOutOfRange {
                index: self.correct_index,
                len: self.answers.len(),
            })?;

        Ok(Question {
            id: self.id.unwrap_or_else(QuestionId::generate),
            text: self.text,
            answers: self.answers,
            correct_index,
            topic: normalize_optional(self.topic),
            explanation: normalize_optional(self.explanation),
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question.
///
/// `correct_index` always points at a valid entry of `answers`; every
/// operation that reorders answers remaps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    answers: Vec<String>,
    correct_index: usize,
    topic: Option<String>,
    explanation: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.answers[self.correct_index]
    }

    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_index
    }

    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Returns a copy with answers rearranged so that new position `i` holds
    /// the answer previously at `order[i]`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidAnswerOrder` if `order` is not a
    /// permutation of the answer positions.
    pub fn with_answer_order(&self, order: &[usize]) -> Result<Self, QuestionError> {
        let len = self.answers.len();
        if order.len() != len {
            return Err(QuestionError::InvalidAnswerOrder { len });
        }
        let mut seen = vec![false; len];
        for &idx in order {
            match seen.get_mut(idx) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(QuestionError::InvalidAnswerOrder { len }),
            }
        }

        let answers = order.iter().map(|&idx| self.answers[idx].clone()).collect();
        let correct_index = order
            .iter()
            .position(|&idx| idx == self.correct_index)
            .ok_or(QuestionError::InvalidAnswerOrder { len })?;

        Ok(Self {
            answers,
            correct_index,
            ..self.clone()
        })
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
