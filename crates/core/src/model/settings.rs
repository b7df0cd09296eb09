use thiserror::Error;

use crate::model::topic::TopicFilter;

pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 30;
pub const MAX_TIME_LIMIT_MINUTES: u32 = 600;

/// User preferences that shape how sessions are built and presented.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct QuizSettings {
    dark_mode: bool,
    timer_enabled: bool,
    time_limit_minutes: u32,
    shuffle_questions: bool,
    shuffle_answers: bool,
    selected_topic: TopicFilter,
}

#[derive(Clone, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct QuizSettingsDraft {
    pub dark_mode: bool,
    pub timer_enabled: bool,
    pub time_limit_minutes: Option<u32>,
    pub shuffle_questions: bool,
    pub shuffle_answers: bool,
    pub selected_topic: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("time limit must be between 1 and {MAX_TIME_LIMIT_MINUTES} minutes (got {0})")]
    InvalidTimeLimit(u32),
}

impl QuizSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft into settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidTimeLimit` if the time limit is zero or
    /// above the supported maximum.
    pub fn validate(self) -> Result<QuizSettings, SettingsError> {
        let time_limit_minutes = self.time_limit_minutes.unwrap_or(DEFAULT_TIME_LIMIT_MINUTES);
        validate_time_limit(time_limit_minutes)?;

        Ok(QuizSettings {
            dark_mode: self.dark_mode,
            timer_enabled: self.timer_enabled,
            time_limit_minutes,
            shuffle_questions: self.shuffle_questions,
            shuffle_answers: self.shuffle_answers,
            selected_topic: self
                .selected_topic
                .as_deref()
                .map_or(TopicFilter::All, TopicFilter::parse),
        })
    }
}

impl QuizSettings {
    /// Rehydrate settings from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the stored values are out of range.
    pub fn from_persisted(draft: QuizSettingsDraft) -> Result<Self, SettingsError> {
        draft.validate()
    }

    #[must_use]
    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    #[must_use]
    pub fn timer_enabled(&self) -> bool {
        self.timer_enabled
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_minutes.saturating_mul(60)
    }

    #[must_use]
    pub fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }

    #[must_use]
    pub fn shuffle_answers(&self) -> bool {
        self.shuffle_answers
    }

    #[must_use]
    pub fn selected_topic(&self) -> &TopicFilter {
        &self.selected_topic
    }

    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
    }

    pub fn toggle_timer(&mut self) {
        self.timer_enabled = !self.timer_enabled;
    }

    pub fn toggle_shuffle_questions(&mut self) {
        self.shuffle_questions = !self.shuffle_questions;
    }

    pub fn toggle_shuffle_answers(&mut self) {
        self.shuffle_answers = !self.shuffle_answers;
    }

    /// Update the session time limit.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidTimeLimit` for zero or oversized limits;
    /// the current value is kept.
    pub fn set_time_limit_minutes(&mut self, minutes: u32) -> Result<(), SettingsError> {
        validate_time_limit(minutes)?;
        self.time_limit_minutes = minutes;
        Ok(())
    }

    pub fn set_selected_topic(&mut self, topic: TopicFilter) {
        self.selected_topic = topic;
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            timer_enabled: false,
            time_limit_minutes: DEFAULT_TIME_LIMIT_MINUTES,
            shuffle_questions: false,
            shuffle_answers: false,
            selected_topic: TopicFilter::All,
        }
    }
}

fn validate_time_limit(minutes: u32) -> Result<(), SettingsError> {
    if minutes == 0 || minutes > MAX_TIME_LIMIT_MINUTES {
        return Err(SettingsError::InvalidTimeLimit(minutes));
    }
    Ok(())
}
