//! Explicitly constructed quiz context exposing the presentation-layer
//! command surface.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::model::{
    HistoryEntry, HistoryFilter, HistoryLog, Question, QuizSettings, TopicFilter,
};
use storage::repository::Storage;

use crate::error::{QuizAppError, SessionError, SettingsServiceError};
use crate::export::{ExportDocument, ExportFormat};
use crate::history_service::HistoryService;
use crate::question_store::QuestionStore;
use crate::sessions::{
    QuestionView, QuizSession, ResultView, ReviewView, SessionBuilder, SessionKind, SessionPhase,
    SessionPlan, SessionTick, SubmitOutcome, Submission, TickOutcome, TickScheduler, TimerConfig,
    WorkingSet, cycle_down, cycle_up,
};
use crate::settings_service::SettingsService;
use crate::topics::{TopicStats, available_topics, filter_by_topic};

/// Start-screen data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeView {
    pub questions_loaded: usize,
    pub topics: Vec<TopicFilter>,
    pub selected_topic: TopicFilter,
    pub topic_stats: TopicStats,
    pub settings: QuizSettings,
    pub history_entries: usize,
}

/// Whatever the presentation layer should draw next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Home(HomeView),
    Question(QuestionView),
    Result(ResultView),
    Review(ReviewView),
}

/// Summary of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub questions: usize,
    pub topics: Vec<TopicFilter>,
    pub topic_stats: TopicStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResponse {
    ConfirmationRequired { unanswered: usize },
    Submitted(ResultView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickResponse {
    Ignored,
    Running { remaining_secs: u32 },
    Expired(ResultView),
}

/// One user's quiz context: loaded questions, settings, history and the
/// session state machine, plus the services that persist them.
///
/// Persistence failures never abort a command; they are logged and queued
/// as warnings for the presentation layer (see [`QuizApp::take_warnings`]).
pub struct QuizApp {
    settings_service: SettingsService,
    history_service: HistoryService,
    ticks: Arc<dyn TickScheduler>,
    rng: StdRng,
    settings: QuizSettings,
    history: HistoryLog,
    history_filter: HistoryFilter,
    store: Option<QuestionStore>,
    session: QuizSession,
    warnings: Vec<String>,
}

impl QuizApp {
    /// Context with default settings and empty history; nothing is read
    /// from storage.
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock, ticks: Arc<dyn TickScheduler>) -> Self {
        Self {
            settings_service: SettingsService::new(Arc::clone(&storage.settings)),
            history_service: HistoryService::new(clock, Arc::clone(&storage.history)),
            ticks,
            rng: StdRng::from_os_rng(),
            settings: QuizSettings::default(),
            history: HistoryLog::new(),
            history_filter: HistoryFilter::All,
            store: None,
            session: QuizSession::new(),
            warnings: Vec::new(),
        }
    }

    /// Context primed from storage. Unreadable settings or history fall back
    /// to defaults with a warning.
    pub async fn open(storage: &Storage, clock: Clock, ticks: Arc<dyn TickScheduler>) -> Self {
        let mut app = Self::new(storage, clock, ticks);

        match app.settings_service.load().await {
            Ok(settings) => app.settings = settings,
            Err(err) => app.persistence_failed("load settings", &err),
        }
        match app.history_service.load().await {
            Ok(history) => app.history = history,
            Err(err) => app.persistence_failed("load history", &err),
        }

        debug!(history = app.history.len(), "quiz context opened");
        app
    }

    /// Replace the shuffle source, e.g. with a seeded one.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    fn persistence_failed(&mut self, action: &str, err: &dyn std::error::Error) {
        warn!(action, error = %err, "persistence failed; continuing in memory");
        self.warnings.push(format!("could not {action}: {err}"));
    }

    /// Drain queued non-fatal warnings.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    #[must_use]
    pub fn store(&self) -> Option<&QuestionStore> {
        self.store.as_ref()
    }

    //
    // ─── QUESTIONS & TOPICS ────────────────────────────────────────────────────
    //

    /// Import a question document, replacing the current set only if every
    /// record validates.
    ///
    /// # Errors
    ///
    /// Returns `QuizAppError::Import` for rejected documents and
    /// `SessionError::InvalidTransition` while an attempt is running.
    pub fn load_questions(&mut self, raw: &str) -> Result<ImportSummary, QuizAppError> {
        if self.session.phase() == SessionPhase::Active {
            return Err(SessionError::InvalidTransition {
                action: "load questions",
                phase: SessionPhase::Active,
            }
            .into());
        }

        let store = QuestionStore::load(raw)?;
        self.store = Some(store);
        Ok(ImportSummary {
            questions: self.store.as_ref().map_or(0, QuestionStore::len),
            topics: self.topics(),
            topic_stats: self.topic_stats(),
        })
    }

    fn canonical(&self) -> &[Question] {
        self.store
            .as_ref()
            .map(QuestionStore::questions)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn topics(&self) -> Vec<TopicFilter> {
        available_topics(self.canonical())
    }

    #[must_use]
    pub fn topic_stats(&self) -> TopicStats {
        let canonical = self.canonical();
        let selected = canonical
            .iter()
            .filter(|q| self.settings.selected_topic().matches(q.topic()))
            .count();
        TopicStats::new(selected, canonical.len())
    }

    fn filtered(&self) -> Result<Vec<Question>, SessionError> {
        let store = self.store.as_ref().ok_or(SessionError::NoQuestionsLoaded)?;
        Ok(filter_by_topic(
            store.questions(),
            self.settings.selected_topic(),
        ))
    }

    /// Choose the topic used by the next fresh attempt.
    pub async fn select_topic(&mut self, topic: TopicFilter) -> TopicStats {
        self.settings.set_selected_topic(topic);
        self.persist_settings().await;
        self.topic_stats()
    }

    //
    // ─── SESSION COMMANDS ──────────────────────────────────────────────────────
    //

    fn begin(&mut self, working: WorkingSet, kind: SessionKind) -> Result<Screen, QuizAppError> {
        if self.session.phase() == SessionPhase::Active {
            return Err(SessionError::InvalidTransition {
                action: "start",
                phase: SessionPhase::Active,
            }
            .into());
        }

        self.session.reset();
        let plan = SessionPlan {
            working,
            kind,
            topic: self.settings.selected_topic().clone(),
        };
        self.session.start(
            plan,
            TimerConfig::from_settings(&self.settings),
            self.ticks.as_ref(),
        )?;
        Ok(self.screen())
    }

    /// Start a fresh attempt over the selected topic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestionsLoaded` before an import,
    /// `SessionError::EmptySet` when the topic selects nothing and
    /// `SessionError::InvalidTransition` while an attempt is running.
    pub fn start_session(&mut self) -> Result<Screen, QuizAppError> {
        let filtered = self.filtered()?;
        let working = SessionBuilder::from_settings(&self.settings)
            .build_fresh(&filtered, &mut self.rng)?;
        self.begin(working, SessionKind::Fresh)
    }

    /// Replay only the questions answered wrongly in the last attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoResult` without a graded attempt and
    /// `SessionError::EmptyRetrySet` if none of them still exist.
    pub fn retry_wrong(&mut self) -> Result<Screen, QuizAppError> {
        let submission = self.session.submission().ok_or(SessionError::NoResult)?;
        let store = self.store.as_ref().ok_or(SessionError::NoQuestionsLoaded)?;
        let working = SessionBuilder::build_retry(&submission.grade.wrong, store)?;
        self.begin(working, SessionKind::RetryWrong)
    }

    /// Replay the whole filtered set in canonical order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptySet` when the topic selects nothing.
    pub fn retry_all(&mut self) -> Result<Screen, QuizAppError> {
        let working = SessionBuilder::build_retry_all(&self.filtered()?)?;
        self.begin(working, SessionKind::RetryAll)
    }

    /// Abandon whatever is on screen and return to the start screen.
    /// History is left untouched.
    pub fn go_home(&mut self) -> Screen {
        self.session.reset();
        self.screen()
    }

    /// # Errors
    ///
    /// Returns `QuizAppError::Session` for invalid choices or phases.
    pub fn select_answer(&mut self, choice: usize) -> Result<Screen, QuizAppError> {
        self.session.select_answer(choice)?;
        Ok(self.screen())
    }

    fn answer_count(&self) -> usize {
        self.session
            .working()
            .get(self.session.position())
            .map_or(0, |item| item.question().answer_count())
    }

    /// Move the selection one answer up.
    ///
    /// # Errors
    ///
    /// Returns `QuizAppError::Session` outside an active attempt.
    pub fn select_previous_answer(&mut self) -> Result<Screen, QuizAppError> {
        match cycle_up(self.session.current_answer(), self.answer_count()) {
            Some(choice) => self.select_answer(choice),
            None => Ok(self.screen()),
        }
    }

    /// Move the selection one answer down.
    ///
    /// # Errors
    ///
    /// Returns `QuizAppError::Session` outside an active attempt.
    pub fn select_next_answer(&mut self) -> Result<Screen, QuizAppError> {
        match cycle_down(self.session.current_answer(), self.answer_count()) {
            Some(choice) => self.select_answer(choice),
            None => Ok(self.screen()),
        }
    }

    /// # Errors
    ///
    /// Returns `QuizAppError::Session` unless answering or reviewing.
    pub fn next(&mut self) -> Result<Screen, QuizAppError> {
        self.session.next()?;
        Ok(self.screen())
    }

    /// # Errors
    ///
    /// Returns `QuizAppError::Session` unless answering or reviewing.
    pub fn prev(&mut self) -> Result<Screen, QuizAppError> {
        self.session.prev()?;
        Ok(self.screen())
    }

    /// # Errors
    ///
    /// Returns `QuizAppError::Session` for invalid positions or phases.
    pub fn go_to(&mut self, position: usize) -> Result<Screen, QuizAppError> {
        self.session.go_to(position)?;
        Ok(self.screen())
    }

    /// # Errors
    ///
    /// Returns `QuizAppError::Session` outside an active attempt.
    pub fn toggle_bookmark(&mut self) -> Result<Screen, QuizAppError> {
        self.session.toggle_bookmark()?;
        Ok(self.screen())
    }

    /// Submit the attempt; see [`QuizSession::submit`].
    ///
    /// # Errors
    ///
    /// Returns `QuizAppError::Session` outside an active attempt.
    pub async fn submit(&mut self, force: bool) -> Result<SubmitResponse, QuizAppError> {
        match self.session.submit(force)? {
            SubmitOutcome::ConfirmationRequired { unanswered } => {
                Ok(SubmitResponse::ConfirmationRequired { unanswered })
            }
            SubmitOutcome::Submitted(submission) => {
                self.record(&submission).await;
                Ok(SubmitResponse::Submitted(self.result_view()?))
            }
        }
    }

    /// Feed one timer tick to the running attempt.
    ///
    /// # Errors
    ///
    /// Propagates grading failures from a forced submit.
    pub async fn handle_tick(&mut self, tick: SessionTick) -> Result<TickResponse, QuizAppError> {
        match self.session.tick(tick)? {
            TickOutcome::Ignored => Ok(TickResponse::Ignored),
            TickOutcome::Running { remaining_secs } => Ok(TickResponse::Running { remaining_secs }),
            TickOutcome::Expired(submission) => {
                self.record(&submission).await;
                Ok(TickResponse::Expired(self.result_view()?))
            }
        }
    }

    async fn record(&mut self, submission: &Submission) {
        let entry = match submission.history_entry(self.history_service.now()) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!("retry attempt not recorded");
                return;
            }
            Err(err) => {
                warn!(error = %err, "attempt could not be turned into a history entry");
                return;
            }
        };

        self.history.push(entry.clone());
        if let Err(err) = self.history_service.record(&entry).await {
            self.persistence_failed("save history", &err);
        }
        info!(entries = self.history.len(), "attempt recorded");
    }

    fn result_view(&self) -> Result<ResultView, SessionError> {
        self.session.result_view().ok_or(SessionError::NoResult)
    }

    /// # Errors
    ///
    /// Returns `QuizAppError::Session` unless submitted.
    pub fn enter_review(&mut self) -> Result<Screen, QuizAppError> {
        self.session.enter_review()?;
        Ok(self.screen())
    }

    /// # Errors
    ///
    /// Returns `QuizAppError::Session` unless reviewing.
    pub fn exit_review(&mut self) -> Result<Screen, QuizAppError> {
        self.session.exit_review()?;
        Ok(self.screen())
    }

    /// Render data for the current phase.
    #[must_use]
    pub fn screen(&self) -> Screen {
        let view = match self.session.phase() {
            SessionPhase::Setup => None,
            SessionPhase::Active => self.session.question_view().map(Screen::Question),
            SessionPhase::Submitted => self.session.result_view().map(Screen::Result),
            SessionPhase::Reviewing => self.session.review_view().map(Screen::Review),
        };
        view.unwrap_or_else(|| Screen::Home(self.home_view()))
    }

    #[must_use]
    pub fn home_view(&self) -> HomeView {
        HomeView {
            questions_loaded: self.canonical().len(),
            topics: self.topics(),
            selected_topic: self.settings.selected_topic().clone(),
            topic_stats: self.topic_stats(),
            settings: self.settings.clone(),
            history_entries: self.history.len(),
        }
    }

    //
    // ─── SETTINGS ──────────────────────────────────────────────────────────────
    //

    async fn persist_settings(&mut self) {
        if let Err(err) = self.settings_service.save(&self.settings).await {
            self.persistence_failed("save settings", &err);
        }
    }

    pub async fn toggle_dark_mode(&mut self) -> &QuizSettings {
        self.settings.toggle_dark_mode();
        self.persist_settings().await;
        &self.settings
    }

    pub async fn toggle_timer(&mut self) -> &QuizSettings {
        self.settings.toggle_timer();
        self.persist_settings().await;
        &self.settings
    }

    pub async fn toggle_shuffle_questions(&mut self) -> &QuizSettings {
        self.settings.toggle_shuffle_questions();
        self.persist_settings().await;
        &self.settings
    }

    pub async fn toggle_shuffle_answers(&mut self) -> &QuizSettings {
        self.settings.toggle_shuffle_answers();
        self.persist_settings().await;
        &self.settings
    }

    /// # Errors
    ///
    /// Returns `QuizAppError::Settings` for limits outside 1..=600 minutes;
    /// the previous limit is kept.
    pub async fn set_time_limit_minutes(
        &mut self,
        minutes: u32,
    ) -> Result<&QuizSettings, QuizAppError> {
        self.settings
            .set_time_limit_minutes(minutes)
            .map_err(SettingsServiceError::from)?;
        self.persist_settings().await;
        Ok(&self.settings)
    }

    //
    // ─── HISTORY ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn history_filter(&self) -> HistoryFilter {
        self.history_filter
    }

    /// Entries matching the active filter, newest first.
    #[must_use]
    pub fn history(&self) -> Vec<&HistoryEntry> {
        self.history.filter(self.history_filter)
    }

    pub fn filter_history(&mut self, filter: HistoryFilter) -> Vec<&HistoryEntry> {
        self.history_filter = filter;
        self.history()
    }

    /// Forget every attempt and reset the history filter.
    pub async fn clear_history(&mut self) {
        self.history.clear();
        self.history_filter = HistoryFilter::All;
        if let Err(err) = self.history_service.clear().await {
            self.persistence_failed("clear history", &err);
        }
    }

    /// Render the full history, ignoring the active filter.
    ///
    /// # Errors
    ///
    /// Returns `QuizAppError::History` when the history is empty or
    /// rendering fails.
    pub fn export_history(&self, format: ExportFormat) -> Result<ExportDocument, QuizAppError> {
        Ok(self
            .history_service
            .export(format, self.history.entries())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::ManualTicks;
    use quiz_core::time::fixed_clock;

    const DOC: &str = r#"{"questions": [
        {"id": "Q1", "question": "2+2?", "answers": ["3", "4"], "correct": 1, "topic": "math"},
        {"id": "Q2", "question": "Capital of Italy?", "answers": ["Rome", "Oslo"], "correct": 0, "topic": "geo"}
    ]}"#;

    fn app() -> QuizApp {
        QuizApp::new(
            &Storage::in_memory(),
            fixed_clock(),
            Arc::new(ManualTicks::new()),
        )
        .with_rng(StdRng::seed_from_u64(11))
    }

    #[test]
    fn start_before_import_is_rejected() {
        let mut app = app();
        assert!(matches!(
            app.start_session(),
            Err(QuizAppError::Session(SessionError::NoQuestionsLoaded))
        ));
        assert!(matches!(app.screen(), Screen::Home(_)));
    }

    #[tokio::test]
    async fn empty_topic_blocks_start_and_keeps_state() {
        let mut app = app();
        app.load_questions(DOC).unwrap();
        let stats = app.select_topic(TopicFilter::from("history")).await;
        assert_eq!(stats.selected, 0);

        assert!(matches!(
            app.start_session(),
            Err(QuizAppError::Session(SessionError::EmptySet))
        ));
        assert_eq!(app.phase(), SessionPhase::Setup);
        assert_eq!(app.store().map(QuestionStore::len), Some(2));
    }

    #[test]
    fn failed_import_keeps_previous_set() {
        let mut app = app();
        app.load_questions(DOC).unwrap();
        let bad = r#"{"questions": [{"question": "", "answers": ["a"], "correct": 3}]}"#;
        assert!(matches!(
            app.load_questions(bad),
            Err(QuizAppError::Import(_))
        ));
        assert_eq!(app.store().map(QuestionStore::len), Some(2));
    }

    #[test]
    fn import_is_refused_mid_attempt() {
        let mut app = app();
        app.load_questions(DOC).unwrap();
        app.start_session().unwrap();
        assert!(matches!(
            app.load_questions(DOC),
            Err(QuizAppError::Session(SessionError::InvalidTransition { .. }))
        ));
    }

    #[tokio::test]
    async fn clear_history_resets_filter() {
        let mut app = app();
        app.load_questions(DOC).unwrap();
        app.start_session().unwrap();
        app.submit(true).await.unwrap();
        app.filter_history(HistoryFilter::Excellent);

        app.clear_history().await;
        assert_eq!(app.history_filter(), HistoryFilter::All);
        assert!(app.history().is_empty());
        assert!(matches!(
            app.export_history(ExportFormat::Json),
            Err(QuizAppError::History(_))
        ));
    }

    #[tokio::test]
    async fn invalid_time_limit_keeps_previous_value() {
        let mut app = app();
        assert!(app.set_time_limit_minutes(0).await.is_err());
        assert_eq!(app.settings().time_limit_minutes(), 30);
        let settings = app.set_time_limit_minutes(5).await.unwrap();
        assert_eq!(settings.time_limit_secs(), 300);
    }

    #[test]
    fn keyboard_style_selection_moves_within_bounds() {
        let mut app = app();
        app.load_questions(DOC).unwrap();
        app.start_session().unwrap();

        app.select_next_answer().unwrap();
        assert_eq!(app.session().current_answer(), Some(0));
        app.select_next_answer().unwrap();
        app.select_next_answer().unwrap();
        assert_eq!(app.session().current_answer(), Some(1));
        app.select_previous_answer().unwrap();
        assert_eq!(app.session().current_answer(), Some(0));
    }
}
