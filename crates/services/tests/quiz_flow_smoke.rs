use std::sync::Arc;

use quiz_core::model::{HistoryEntry, HistoryFilter, TopicFilter};
use quiz_core::time::fixed_clock;
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::sessions::ReviewStatus;
use services::{
    ExportFormat, ManualTicks, QuizApp, Screen, SessionKind, SessionPhase, SessionTick,
    SubmitResponse, TickResponse,
};
use storage::repository::{HistoryRepository, Storage};

const TWO_QUESTIONS: &str = r#"{"questions": [
    {"id": "Q1", "text": "2+2?", "answers": ["3", "4"], "correct": 1},
    {"id": "Q2", "text": "3+3?", "answers": ["5", "6"], "correct": 1}
]}"#;

const TOPICS: &str = r#"{"questions": [
    {"id": "M1", "question": "1+1?", "answers": ["2", "3"], "correct": 0, "topic": "math"},
    {"id": "M2", "question": "2*3?", "answers": ["5", "6", "7"], "correct": 1, "topic": "math"},
    {"id": "G1", "question": "Capital of Spain?", "answers": ["Madrid", "Lisbon"], "correct": 0, "topic": "geo",
     "explanation": "Madrid has been the capital since 1561."},
    {"id": "G2", "question": "Longest river?", "answers": ["Nile", "Rhine", "Seine", "Po"], "correct": 0, "topic": "geo"}
]}"#;

async fn open(storage: &Storage, ticks: &ManualTicks) -> QuizApp {
    QuizApp::open(storage, fixed_clock(), Arc::new(ticks.clone()))
        .await
        .with_rng(StdRng::seed_from_u64(42))
}

#[tokio::test]
async fn half_right_attempt_scores_five_and_is_recorded() {
    let storage = Storage::in_memory();
    let ticks = ManualTicks::new();
    let mut app = open(&storage, &ticks).await;

    app.load_questions(TWO_QUESTIONS).unwrap();
    app.start_session().unwrap();
    app.select_answer(0).unwrap();
    app.next().unwrap();
    app.select_answer(1).unwrap();

    let SubmitResponse::Submitted(result) = app.submit(false).await.unwrap() else {
        panic!("all questions were answered");
    };
    assert_eq!(result.score.to_string(), "5.00");
    assert_eq!(result.correct, 1);
    assert_eq!(result.wrong_answers.len(), 1);
    assert_eq!(result.wrong_answers[0].question_id.as_str(), "Q1");
    assert_eq!(result.wrong_answers[0].user_answer.as_deref(), Some("3"));
    assert_eq!(result.wrong_answers[0].correct_answer, "4");
    assert_eq!(result.time_spent_secs, None);

    let stored = storage.history.list_entries(50).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].correct_count(), 1);
    assert_eq!(stored[0].time_spent_secs(), None);
}

#[tokio::test]
async fn retry_wrong_replays_k_questions_without_history() {
    let storage = Storage::in_memory();
    let ticks = ManualTicks::new();
    let mut app = open(&storage, &ticks).await;
    app.load_questions(TOPICS).unwrap();

    app.start_session().unwrap();
    app.select_answer(0).unwrap();
    let SubmitResponse::Submitted(result) = app.submit(true).await.unwrap() else {
        panic!("forced submit");
    };
    assert_eq!(result.wrong, 3);
    assert!(result.can_retry_wrong);

    let Screen::Question(first) = app.retry_wrong().unwrap() else {
        panic!("retry should show a question");
    };
    assert_eq!(app.session().kind(), SessionKind::RetryWrong);
    assert_eq!(app.session().working().len(), 3);
    assert_eq!(first.question_id.as_str(), "M2");
    assert_eq!(first.prior_answer, Some(None));

    for _ in 0..3 {
        app.select_answer(0).unwrap();
        app.next().unwrap();
    }
    app.submit(false).await.unwrap();

    assert_eq!(app.history().len(), 1);
    assert_eq!(storage.history.list_entries(50).await.unwrap().len(), 1);
}

#[tokio::test]
async fn retry_all_is_unshuffled_and_recorded() {
    let storage = Storage::in_memory();
    let ticks = ManualTicks::new();
    let mut app = open(&storage, &ticks).await;
    app.toggle_shuffle_questions().await;
    app.toggle_shuffle_answers().await;
    app.load_questions(TOPICS).unwrap();

    app.start_session().unwrap();
    app.submit(true).await.unwrap();

    app.retry_all().unwrap();
    let ids: Vec<_> = app
        .session()
        .working()
        .iter()
        .map(|item| item.question().id().to_string())
        .collect();
    assert_eq!(ids, vec!["M1", "M2", "G1", "G2"]);
    assert!(
        app.session()
            .working()
            .iter()
            .all(|item| item.answer_order().windows(2).all(|w| w[0] < w[1]))
    );

    app.submit(true).await.unwrap();
    assert_eq!(app.history().len(), 2);
}

#[tokio::test]
async fn one_minute_timer_expires_into_history() {
    let storage = Storage::in_memory();
    let ticks = ManualTicks::new();
    let mut app = open(&storage, &ticks).await;
    app.toggle_timer().await;
    app.set_time_limit_minutes(1).await.unwrap();
    app.load_questions(TWO_QUESTIONS).unwrap();
    app.start_session().unwrap();
    assert_eq!(ticks.active(), 1);

    let session = app.session().attempt();
    let mut last = TickResponse::Ignored;
    for _ in 0..60 {
        last = app.handle_tick(SessionTick { session }).await.unwrap();
    }
    let TickResponse::Expired(result) = last else {
        panic!("timer should have expired");
    };

    assert!(result.time_expired);
    assert_eq!(result.time_spent_secs, Some(60));
    assert_eq!(app.phase(), SessionPhase::Submitted);
    assert_eq!(ticks.active(), 0);
    assert_eq!(
        app.handle_tick(SessionTick { session }).await.unwrap(),
        TickResponse::Ignored
    );

    let history: Vec<&HistoryEntry> = app.history();
    assert_eq!(history[0].time_spent_secs(), Some(60));
}

#[tokio::test]
async fn going_home_stops_the_timer_and_keeps_history() {
    let storage = Storage::in_memory();
    let ticks = ManualTicks::new();
    let mut app = open(&storage, &ticks).await;
    app.toggle_timer().await;
    app.load_questions(TWO_QUESTIONS).unwrap();

    app.start_session().unwrap();
    app.select_answer(1).unwrap();
    assert!(matches!(app.go_home(), Screen::Home(_)));
    assert_eq!(ticks.active(), 0);
    assert!(app.history().is_empty());

    app.start_session().unwrap();
    app.start_session().unwrap_err();
    assert_eq!(ticks.active(), 1);
    assert_eq!(ticks.scheduled(), 2);
}

#[tokio::test]
async fn review_walks_graded_questions() {
    let storage = Storage::in_memory();
    let ticks = ManualTicks::new();
    let mut app = open(&storage, &ticks).await;
    app.load_questions(TOPICS).unwrap();
    app.select_topic(TopicFilter::from("geo")).await;

    app.start_session().unwrap();
    app.select_answer(0).unwrap();
    app.submit(true).await.unwrap();

    let Screen::Review(view) = app.enter_review().unwrap() else {
        panic!("expected review screen");
    };
    assert_eq!(view.total, 2);
    assert_eq!(view.status, ReviewStatus::Correct);
    assert!(view.explanation.is_some());

    let Screen::Review(view) = app.next().unwrap() else {
        panic!("expected review screen");
    };
    assert_eq!(view.status, ReviewStatus::Unanswered);
    assert!(view.is_last);

    assert!(matches!(app.exit_review().unwrap(), Screen::Result(_)));
}

#[tokio::test]
async fn settings_and_history_survive_reopening() {
    let storage = Storage::in_memory();
    let ticks = ManualTicks::new();
    {
        let mut app = open(&storage, &ticks).await;
        app.toggle_dark_mode().await;
        app.select_topic(TopicFilter::from("math")).await;
        app.load_questions(TOPICS).unwrap();
        app.start_session().unwrap();
        app.select_answer(0).unwrap();
        app.next().unwrap();
        app.select_answer(1).unwrap();
        app.submit(false).await.unwrap();
    }

    let mut app = open(&storage, &ticks).await;
    assert!(app.settings().dark_mode());
    assert_eq!(app.settings().selected_topic(), &TopicFilter::from("math"));
    assert_eq!(app.history().len(), 1);
    assert_eq!(app.filter_history(HistoryFilter::Excellent).len(), 1);
    assert!(app.filter_history(HistoryFilter::Good).is_empty());

    let csv = app.export_history(ExportFormat::Csv).unwrap();
    assert!(csv.contents.lines().nth(1).unwrap().ends_with(",10.00,2,2,0,N/A,math"));
    assert!(app.take_warnings().is_empty());
}
