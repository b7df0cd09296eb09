use rand::Rng;
use tracing::{debug, warn};

use quiz_core::model::{Question, QuizSettings};

use crate::error::SessionError;
use crate::grading::WrongAnswerRecord;
use crate::question_store::QuestionStore;

/// A user's answer from an earlier attempt, in canonical answer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorAnswer {
    Unanswered,
    Chosen(usize),
}

/// A question as presented in one session.
///
/// `question` owns its own (possibly reordered) answers; `answer_order[i]` is
/// the canonical index of the answer shown at position `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingQuestion {
    question: Question,
    answer_order: Vec<usize>,
    prior_answer: Option<PriorAnswer>,
}

impl WorkingQuestion {
    fn canonical(question: Question) -> Self {
        let answer_order = (0..question.answer_count()).collect();
        Self {
            question,
            answer_order,
            prior_answer: None,
        }
    }

    fn reordered(canonical: &Question, order: Vec<usize>) -> Result<Self, SessionError> {
        Ok(Self {
            question: canonical.with_answer_order(&order)?,
            answer_order: order,
            prior_answer: None,
        })
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn answer_order(&self) -> &[usize] {
        &self.answer_order
    }

    #[must_use]
    pub fn prior_answer(&self) -> Option<PriorAnswer> {
        self.prior_answer
    }

    /// Canonical index of the answer shown at `shown`.
    #[must_use]
    pub fn canonical_index(&self, shown: usize) -> Option<usize> {
        self.answer_order.get(shown).copied()
    }

    /// Position at which the canonical answer `canonical` is shown.
    #[must_use]
    pub fn shown_index(&self, canonical: usize) -> Option<usize> {
        self.answer_order.iter().position(|&idx| idx == canonical)
    }

    /// Text of the prior answer, if this question carries one that was chosen.
    #[must_use]
    pub fn prior_answer_text(&self) -> Option<&str> {
        match self.prior_answer? {
            PriorAnswer::Chosen(canonical) => self
                .shown_index(canonical)
                .and_then(|shown| self.question.answer(shown)),
            PriorAnswer::Unanswered => None,
        }
    }
}

/// Ordered questions for one session; never aliases the canonical set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkingSet(Vec<WorkingQuestion>);

impl WorkingSet {
    #[must_use]
    pub fn items(&self) -> &[WorkingQuestion] {
        &self.0
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&WorkingQuestion> {
        self.0.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WorkingQuestion> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a WorkingSet {
    type Item = &'a WorkingQuestion;
    type IntoIter = std::slice::Iter<'a, WorkingQuestion>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Unbiased in-place permutation: walk from the last index down to 1,
/// swapping each slot with a uniformly chosen index in `[0, i]`.
pub fn fisher_yates<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Derives working sets for fresh attempts and retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionBuilder {
    shuffle_questions: bool,
    shuffle_answers: bool,
}

impl SessionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_settings(settings: &QuizSettings) -> Self {
        Self {
            shuffle_questions: settings.shuffle_questions(),
            shuffle_answers: settings.shuffle_answers(),
        }
    }

    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        self.shuffle_questions = shuffle;
        self
    }

    #[must_use]
    pub fn with_shuffle_answers(mut self, shuffle: bool) -> Self {
        self.shuffle_answers = shuffle;
        self
    }

    /// Build a fresh attempt from a topic-filtered set.
    ///
    /// Question order and each question's answer order are shuffled
    /// independently when enabled; the correct answer is tracked through
    /// every reordering.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptySet` if `filtered` is empty.
    pub fn build_fresh<R: Rng>(
        &self,
        filtered: &[Question],
        rng: &mut R,
    ) -> Result<WorkingSet, SessionError> {
        if filtered.is_empty() {
            return Err(SessionError::EmptySet);
        }

        let mut picked: Vec<&Question> = filtered.iter().collect();
        if self.shuffle_questions {
            fisher_yates(&mut picked, rng);
        }

        let items = picked
            .into_iter()
            .map(|question| {
                if self.shuffle_answers {
                    let mut order: Vec<usize> = (0..question.answer_count()).collect();
                    fisher_yates(&mut order, rng);
                    WorkingQuestion::reordered(question, order)
                } else {
                    Ok(WorkingQuestion::canonical(question.clone()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            questions = items.len(),
            shuffle_questions = self.shuffle_questions,
            shuffle_answers = self.shuffle_answers,
            "built fresh working set"
        );
        Ok(WorkingSet(items))
    }

    /// Rebuild the wrongly answered questions of an attempt from the live
    /// canonical set, unshuffled, each carrying the user's prior answer.
    ///
    /// Records whose id no longer resolves are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyRetrySet` if no record resolves.
    pub fn build_retry(
        wrong: &[WrongAnswerRecord],
        store: &QuestionStore,
    ) -> Result<WorkingSet, SessionError> {
        let mut items = Vec::with_capacity(wrong.len());
        for record in wrong {
            let Some(question) = store.lookup(&record.question_id) else {
                warn!(id = %record.question_id, "retry question no longer exists; skipped");
                continue;
            };
            let mut item = WorkingQuestion::canonical(question.clone());
            item.prior_answer = Some(
                record
                    .canonical_user_answer
                    .map_or(PriorAnswer::Unanswered, PriorAnswer::Chosen),
            );
            items.push(item);
        }

        if items.is_empty() {
            return Err(SessionError::EmptyRetrySet);
        }
        debug!(questions = items.len(), "built retry working set");
        Ok(WorkingSet(items))
    }

    /// Replay the whole filtered set in canonical order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptySet` if `filtered` is empty.
    pub fn build_retry_all(filtered: &[Question]) -> Result<WorkingSet, SessionError> {
        if filtered.is_empty() {
            return Err(SessionError::EmptySet);
        }
        Ok(WorkingSet(
            filtered.iter().cloned().map(WorkingQuestion::canonical).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionDraft, QuestionId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn question(id: &str, answers: &[&str], correct: i64) -> Question {
        QuestionDraft {
            id: Some(QuestionId::new(id).unwrap()),
            text: format!("{id}?"),
            answers: answers.iter().map(|a| (*a).to_string()).collect(),
            correct_index: correct,
            topic: None,
            explanation: None,
        }
        .validate()
        .unwrap()
    }

    fn sample() -> Vec<Question> {
        (0..8)
            .map(|n| question(&format!("Q{n}"), &["w", "x", "y", "z"], n % 4))
            .collect()
    }

    fn ids(set: &WorkingSet) -> Vec<String> {
        set.iter()
            .map(|item| item.question().id().to_string())
            .collect()
    }

    #[test]
    fn fisher_yates_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut items: Vec<u32> = (0..50).collect();
        fisher_yates(&mut items, &mut rng);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn fisher_yates_handles_tiny_slices() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut empty: Vec<u8> = Vec::new();
        fisher_yates(&mut empty, &mut rng);
        let mut one = vec![1];
        fisher_yates(&mut one, &mut rng);
        assert_eq!(one, vec![1]);
    }

    #[test]
    fn fresh_without_shuffle_keeps_order() {
        let questions = sample();
        let set = SessionBuilder::new()
            .build_fresh(&questions, &mut StdRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(set.len(), questions.len());
        for (item, original) in set.iter().zip(&questions) {
            assert_eq!(item.question(), original);
            assert_eq!(item.answer_order(), &[0, 1, 2, 3]);
            assert!(item.prior_answer().is_none());
        }
    }

    #[test]
    fn question_shuffle_keeps_every_question() {
        let questions = sample();
        let set = SessionBuilder::new()
            .with_shuffle_questions(true)
            .build_fresh(&questions, &mut StdRng::seed_from_u64(3))
            .unwrap();

        let mut shuffled = ids(&set);
        shuffled.sort();
        let mut original: Vec<_> = questions.iter().map(|q| q.id().to_string()).collect();
        original.sort();
        assert_eq!(shuffled, original);
    }

    #[test]
    fn answer_shuffle_tracks_the_correct_answer() {
        let questions = sample();
        for seed in 0..20 {
            let set = SessionBuilder::new()
                .with_shuffle_questions(true)
                .with_shuffle_answers(true)
                .build_fresh(&questions, &mut StdRng::seed_from_u64(seed))
                .unwrap();

            for item in &set {
                let shown = item.question();
                let original = questions.iter().find(|q| q.id() == shown.id()).unwrap();

                assert!(shown.correct_index() < shown.answer_count());
                assert_eq!(shown.correct_answer(), original.correct_answer());

                let mut before = original.answers().to_vec();
                let mut after = shown.answers().to_vec();
                before.sort();
                after.sort();
                assert_eq!(before, after);

                for (pos, &canonical) in item.answer_order().iter().enumerate() {
                    assert_eq!(shown.answer(pos), original.answer(canonical));
                }
            }
        }
    }

    #[test]
    fn shuffling_never_touches_the_source() {
        let questions = sample();
        let before = questions.clone();
        let _ = SessionBuilder::new()
            .with_shuffle_questions(true)
            .with_shuffle_answers(true)
            .build_fresh(&questions, &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert_eq!(questions, before);
    }

    #[test]
    fn empty_filtered_set_is_rejected() {
        let err = SessionBuilder::new()
            .build_fresh(&[], &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, SessionError::EmptySet));
        assert!(matches!(
            SessionBuilder::build_retry_all(&[]),
            Err(SessionError::EmptySet)
        ));
    }

    #[test]
    fn retry_resolves_ids_and_attaches_prior_answers() {
        let store = QuestionStore::from_questions(sample()).unwrap();
        let wrong = vec![
            WrongAnswerRecord {
                question_id: QuestionId::new("Q2").unwrap(),
                position: 5,
                user_answer: Some(3),
                canonical_user_answer: Some(1),
                correct_answer: 0,
            },
            WrongAnswerRecord {
                question_id: QuestionId::new("gone").unwrap(),
                position: 6,
                user_answer: None,
                canonical_user_answer: None,
                correct_answer: 0,
            },
            WrongAnswerRecord {
                question_id: QuestionId::new("Q5").unwrap(),
                position: 7,
                user_answer: None,
                canonical_user_answer: None,
                correct_answer: 0,
            },
        ];

        let set = SessionBuilder::build_retry(&wrong, &store).unwrap();
        assert_eq!(ids(&set), vec!["Q2", "Q5"]);
        assert_eq!(set.items()[0].prior_answer(), Some(PriorAnswer::Chosen(1)));
        assert_eq!(set.items()[0].prior_answer_text(), Some("x"));
        assert_eq!(set.items()[1].prior_answer(), Some(PriorAnswer::Unanswered));
        assert_eq!(set.items()[1].prior_answer_text(), None);
    }

    #[test]
    fn retry_with_nothing_resolvable_fails() {
        let store = QuestionStore::from_questions(sample()).unwrap();
        let wrong = vec![WrongAnswerRecord {
            question_id: QuestionId::new("gone").unwrap(),
            position: 0,
            user_answer: None,
            canonical_user_answer: None,
            correct_answer: 0,
        }];
        assert!(matches!(
            SessionBuilder::build_retry(&wrong, &store),
            Err(SessionError::EmptyRetrySet)
        ));
    }

    #[test]
    fn retry_all_ignores_shuffle_settings() {
        let questions = sample();
        let set = SessionBuilder::build_retry_all(&questions).unwrap();
        let expected: Vec<_> = questions.iter().map(|q| q.id().to_string()).collect();
        assert_eq!(ids(&set), expected);
    }
}
