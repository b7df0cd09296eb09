use serde::{Deserialize, Serialize};
use std::fmt;

/// Selection of questions by topic.
///
/// `All` is the implicit option present for every question set; it is
/// persisted and exported as the literal key `"all"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TopicFilter {
    #[default]
    All,
    Topic(String),
}

impl TopicFilter {
    pub const ALL_KEY: &'static str = "all";

    /// Parse a persisted or user-entered topic key.
    ///
    /// Blank input and `"all"` map to `TopicFilter::All`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == Self::ALL_KEY {
            Self::All
        } else {
            Self::Topic(trimmed.to_owned())
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => Self::ALL_KEY,
            Self::Topic(topic) => topic,
        }
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Returns true when a question tagged with `topic` belongs to this filter.
    #[must_use]
    pub fn matches(&self, topic: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Topic(wanted) => topic == Some(wanted.as_str()),
        }
    }
}

impl fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TopicFilter {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for TopicFilter {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<TopicFilter> for String {
    fn from(value: TopicFilter) -> Self {
        value.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_all_parse_to_all() {
        assert_eq!(TopicFilter::parse(""), TopicFilter::All);
        assert_eq!(TopicFilter::parse(" all "), TopicFilter::All);
        assert_eq!(
            TopicFilter::parse(" Algebra"),
            TopicFilter::Topic("Algebra".into())
        );
    }

    #[test]
    fn all_matches_untagged_questions() {
        assert!(TopicFilter::All.matches(None));
        assert!(TopicFilter::All.matches(Some("x")));
    }

    #[test]
    fn topic_matches_exactly() {
        let filter = TopicFilter::from("Algebra");
        assert!(filter.matches(Some("Algebra")));
        assert!(!filter.matches(Some("algebra")));
        assert!(!filter.matches(None));
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&TopicFilter::All).unwrap();
        assert_eq!(json, "\"all\"");
        let back: TopicFilter = serde_json::from_str("\"Geometry\"").unwrap();
        assert_eq!(back, TopicFilter::Topic("Geometry".into()));
    }
}
