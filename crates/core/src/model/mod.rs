mod history;
mod ids;
mod question;
mod score;
mod settings;
mod topic;

pub use ids::{ParseIdError, QuestionId};

pub use history::{HISTORY_CAP, HistoryEntry, HistoryEntryError, HistoryLog};
pub use question::{Question, QuestionDraft, QuestionError};
pub use score::{HistoryFilter, ParseHistoryFilterError, Score, ScoreBand, ScoreError};
pub use settings::{
    DEFAULT_TIME_LIMIT_MINUTES, MAX_TIME_LIMIT_MINUTES, QuizSettings, QuizSettingsDraft,
    SettingsError,
};
pub use topic::TopicFilter;
