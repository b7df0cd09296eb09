//! Canonical question set loaded from an import document.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use quiz_core::model::{Question, QuestionDraft, QuestionId};

use crate::error::{ImportError, ValidationErrors};

/// Largest import document accepted, in bytes.
pub const MAX_IMPORT_BYTES: usize = 5 * 1024 * 1024;

/// Loosely typed record so that type mismatches become per-record messages
/// instead of aborting the whole parse.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawQuestion {
    id: Option<Value>,
    #[serde(alias = "text")]
    question: Option<Value>,
    answers: Option<Value>,
    #[serde(alias = "correctIndex", alias = "correct_index")]
    correct: Option<Value>,
    topic: Option<Value>,
    explanation: Option<Value>,
}

impl RawQuestion {
    fn into_draft(self) -> Result<QuestionDraft, String> {
        let text = match self.question {
            Some(Value::String(text)) => text,
            None | Some(Value::Null) => String::new(),
            Some(_) => return Err("question text must be a string".into()),
        };

        let answers = match self.answers {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    Value::Number(n) => Ok(n.to_string()),
                    _ => Err("answers must be strings".to_string()),
                })
                .collect::<Result<Vec<_>, _>>()?,
            None | Some(Value::Null) => Vec::new(),
            Some(_) => return Err("answers must be a list".into()),
        };

        let correct_index = self
            .correct
            .as_ref()
            .and_then(integer_value)
            .ok_or_else(|| {
                format!(
                    "correct answer index must be an integer (got {})",
                    self.correct.as_ref().map_or("nothing".into(), Value::to_string)
                )
            })?;

        let id = match self.id {
            Some(Value::String(s)) => QuestionId::new(s).ok(),
            Some(Value::Number(n)) => QuestionId::new(n.to_string()).ok(),
            None | Some(Value::Null) => None,
            Some(_) => return Err("id must be a string or a number".into()),
        };

        Ok(QuestionDraft {
            id,
            text,
            answers,
            correct_index,
            topic: string_value(self.topic),
            explanation: string_value(self.explanation),
        })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer_value(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < 1e15)
            .map(|f| f as i64)
    })
}

fn string_value(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// The canonical, as-imported question set plus an id index.
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    questions: Vec<Question>,
    index: HashMap<QuestionId, usize>,
}

impl QuestionStore {
    /// Parse and validate an import document.
    ///
    /// Every record is checked and all failures are collected before the
    /// import is rejected, so nothing is committed unless the whole document
    /// is valid.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::TooLarge`, `ImportError::Malformed` or
    /// `ImportError::MissingQuestions` for document-level problems, and
    /// `ImportError::Validation` listing one message per offending record.
    pub fn load(raw: &str) -> Result<Self, ImportError> {
        if raw.len() > MAX_IMPORT_BYTES {
            return Err(ImportError::TooLarge {
                bytes: raw.len(),
                max: MAX_IMPORT_BYTES,
            });
        }

        let document: Value =
            serde_json::from_str(raw).map_err(|e| ImportError::Malformed(e.to_string()))?;
        let records = document
            .get("questions")
            .and_then(Value::as_array)
            .filter(|records| !records.is_empty())
            .ok_or(ImportError::MissingQuestions)?;

        let mut questions = Vec::with_capacity(records.len());
        let mut messages = Vec::new();
        for (idx, record) in records.iter().enumerate() {
            let parsed = serde_json::from_value::<RawQuestion>(record.clone())
                .map_err(|e| format!("record is not a question object ({e})"))
                .and_then(RawQuestion::into_draft)
                .and_then(|draft| draft.validate().map_err(|e| e.to_string()));
            match parsed {
                Ok(question) => questions.push(question),
                Err(message) => messages.push(format!("question {}: {message}", idx + 1)),
            }
        }

        if !messages.is_empty() {
            debug!(invalid = messages.len(), "import rejected");
            return Err(ValidationErrors::new(messages).into());
        }

        let store = Self::from_questions(questions)?;
        info!(questions = store.len(), "question set imported");
        Ok(store)
    }

    /// Build a store from already validated questions.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Validation` if two questions share an id.
    pub fn from_questions(questions: Vec<Question>) -> Result<Self, ImportError> {
        let mut index = HashMap::with_capacity(questions.len());
        let mut messages = Vec::new();
        for (idx, question) in questions.iter().enumerate() {
            if index.insert(question.id().clone(), idx).is_some() {
                messages.push(format!(
                    "question {}: duplicate id {}",
                    idx + 1,
                    question.id()
                ));
            }
        }

        if !messages.is_empty() {
            return Err(ValidationErrors::new(messages).into());
        }

        Ok(Self { questions, index })
    }

    #[must_use]
    pub fn lookup(&self, id: &QuestionId) -> Option<&Question> {
        self.index.get(id).and_then(|&idx| self.questions.get(idx))
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "questions": [
            {"id": "Q1", "question": "2+2?", "answers": ["3", "4"], "correct": 1, "topic": "math"},
            {"id": "Q2", "text": "3+3?", "answers": ["5", "6"], "correctIndex": 1},
            {"question": "Capital of France?", "answers": ["Paris", "Rome", "Oslo"], "correct": 0,
             "topic": "geo", "explanation": "Paris has been the capital since 987."}
        ]
    }"#;

    #[test]
    fn loads_valid_document_and_indexes_ids() {
        let store = QuestionStore::load(SAMPLE).unwrap();
        assert_eq!(store.len(), 3);

        let q1 = store.lookup(&QuestionId::new("Q1").unwrap()).unwrap();
        assert_eq!(q1.text(), "2+2?");
        assert_eq!(q1.correct_index(), 1);

        let q2 = store.lookup(&QuestionId::new("Q2").unwrap()).unwrap();
        assert_eq!(q2.text(), "3+3?");

        let generated = store.questions()[2].id().clone();
        assert!(generated.as_str().starts_with("Q_"));
        assert_eq!(store.lookup(&generated).unwrap().topic(), Some("geo"));
    }

    #[test]
    fn lookup_miss_returns_none() {
        let store = QuestionStore::load(SAMPLE).unwrap();
        assert!(store.lookup(&QuestionId::new("nope").unwrap()).is_none());
    }

    #[test]
    fn collects_every_invalid_record() {
        let raw = r#"{"questions": [
            {"question": "", "answers": ["a", "b"], "correct": 0},
            {"question": "ok?", "answers": ["a"], "correct": 0},
            {"question": "ok?", "answers": ["a", "b"], "correct": 2},
            {"question": "ok?", "answers": ["a", "b"], "correct": 1},
            {"question": "ok?", "answers": ["a", "b"], "correct": "1"}
        ]}"#;

        let err = QuestionStore::load(raw).unwrap_err();
        let ImportError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.len(), 4);
        assert!(errors.messages()[0].starts_with("question 1:"));
        assert!(errors.messages()[1].starts_with("question 2:"));
        assert!(errors.messages()[2].starts_with("question 3:"));
        assert!(errors.messages()[3].starts_with("question 5:"));
    }

    #[test]
    fn integral_float_index_is_accepted() {
        let raw = r#"{"questions": [{"question": "q", "answers": ["a", "b"], "correct": 1.0}]}"#;
        let store = QuestionStore::load(raw).unwrap();
        assert_eq!(store.questions()[0].correct_index(), 1);

        let raw = r#"{"questions": [{"question": "q", "answers": ["a", "b"], "correct": 0.5}]}"#;
        assert!(matches!(
            QuestionStore::load(raw),
            Err(ImportError::Validation(_))
        ));
    }

    #[test]
    fn rejects_document_level_problems() {
        assert!(matches!(
            QuestionStore::load("not json"),
            Err(ImportError::Malformed(_))
        ));
        assert!(matches!(
            QuestionStore::load(r#"{"items": []}"#),
            Err(ImportError::MissingQuestions)
        ));
        assert!(matches!(
            QuestionStore::load(r#"{"questions": []}"#),
            Err(ImportError::MissingQuestions)
        ));
        assert!(matches!(
            QuestionStore::load(r#"{"questions": {"a": 1}}"#),
            Err(ImportError::MissingQuestions)
        ));
    }

    #[test]
    fn rejects_oversized_documents() {
        let raw = " ".repeat(MAX_IMPORT_BYTES + 1);
        assert!(matches!(
            QuestionStore::load(&raw),
            Err(ImportError::TooLarge { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let raw = r#"{"questions": [
            {"id": "A", "question": "q1", "answers": ["a", "b"], "correct": 0},
            {"id": "A", "question": "q2", "answers": ["a", "b"], "correct": 1}
        ]}"#;
        let err = QuestionStore::load(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate id A"));
    }

    #[test]
    fn numeric_ids_become_strings() {
        let raw = r#"{"questions": [{"id": 7, "question": "q", "answers": ["a", "b"], "correct": 0}]}"#;
        let store = QuestionStore::load(raw).unwrap();
        assert_eq!(store.questions()[0].id().as_str(), "7");
    }
}
