#![forbid(unsafe_code)]

pub mod error;
pub mod export;
pub mod grading;
pub mod history_service;
pub mod question_store;
pub mod quiz_app;
pub mod sessions;
pub mod settings_service;
pub mod topics;

pub use quiz_core::Clock;

pub use error::{
    ExportError, HistoryServiceError, ImportError, QuizAppError, SessionError,
    SettingsServiceError, ValidationErrors,
};
pub use export::{ExportDocument, ExportFormat};
pub use grading::{GradeResult, WrongAnswerRecord, grade};
pub use history_service::HistoryService;
pub use question_store::{MAX_IMPORT_BYTES, QuestionStore};
pub use quiz_app::{HomeView, ImportSummary, QuizApp, Screen, SubmitResponse, TickResponse};
pub use sessions::{
    IntervalTicks, ManualTicks, QuizSession, SessionBuilder, SessionKind, SessionPhase,
    SessionTick, TickScheduler,
};
pub use settings_service::SettingsService;
pub use topics::{TopicStats, available_topics, filter_by_topic};
