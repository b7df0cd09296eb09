//! Topic discovery and filtering over the canonical question set.

use std::collections::BTreeSet;

use quiz_core::model::{Question, TopicFilter};

/// Distinct topics present in `questions`, with `TopicFilter::All` first.
///
/// Untagged questions contribute nothing; named topics come back in
/// lexicographic order.
#[must_use]
pub fn available_topics(questions: &[Question]) -> Vec<TopicFilter> {
    let named: BTreeSet<&str> = questions.iter().filter_map(Question::topic).collect();

    std::iter::once(TopicFilter::All)
        .chain(named.into_iter().map(|t| TopicFilter::Topic(t.to_string())))
        .collect()
}

/// Questions matching `filter`, preserving canonical order.
#[must_use]
pub fn filter_by_topic(questions: &[Question], filter: &TopicFilter) -> Vec<Question> {
    questions
        .iter()
        .filter(|q| filter.matches(q.topic()))
        .cloned()
        .collect()
}

/// How much of the loaded set a topic filter selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicStats {
    pub selected: usize,
    pub total: usize,
}

impl TopicStats {
    #[must_use]
    pub fn new(selected: usize, total: usize) -> Self {
        Self { selected, total }
    }

    /// Selected share of the set as a whole percentage, rounded half up.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.selected * 200 + self.total) / (self.total * 2);
        u32::try_from(pct).unwrap_or(100)
    }
}
