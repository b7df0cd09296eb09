use thiserror::Error;

use crate::model::{HistoryEntryError, QuestionError, ScoreError, SettingsError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    History(#[from] HistoryEntryError),
}
