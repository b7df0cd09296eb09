use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for a question.
///
/// Survives topic filtering, shuffling and retry derivation, so wrong-answer
/// records can always be resolved back to the canonical question.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuestionId(String);

impl QuestionId {
    /// Creates a `QuestionId` from a non-blank string.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the value is empty or whitespace only.
    pub fn new(id: impl Into<String>) -> Result<Self, ParseIdError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError {
                kind: "QuestionId".to_string(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Generates a fresh identifier for records imported without one.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("Q_{}", Uuid::new_v4().simple()))
    }

    /// Returns the underlying string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} format", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for QuestionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for QuestionId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuestionId> for String {
    fn from(value: QuestionId) -> Self {
        value.0
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_id_display() {
        let id = QuestionId::new("Q1").unwrap();
        assert_eq!(id.to_string(), "Q1");
    }

    #[test]
    fn test_question_id_trims_whitespace() {
        let id: QuestionId = "  Q7 ".parse().unwrap();
        assert_eq!(id.as_str(), "Q7");
    }

    #[test]
    fn test_question_id_rejects_blank() {
        assert!("   ".parse::<QuestionId>().is_err());
        assert!(QuestionId::new("").is_err());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = QuestionId::generate();
        let b = QuestionId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("Q_"));
    }

    #[test]
    fn test_id_serde_roundtrip() {
        let original = QuestionId::new("Q42").unwrap();
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, "\"Q42\"");
        let back: QuestionId = serde_json::from_str(&json).unwrap();
        assert_eq!(original, back);
    }
}
