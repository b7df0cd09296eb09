use std::sync::Arc;

use quiz_core::model::QuizSettings;
use storage::repository::SettingsRepository;

use crate::error::SettingsServiceError;

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures, including stored
    /// data that no longer validates.
    pub async fn load(&self) -> Result<QuizSettings, SettingsServiceError> {
        let settings = self.repo.get_settings().await?;
        Ok(settings.unwrap_or_default())
    }

    /// Persist settings that are already valid.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::Storage` if persistence fails.
    pub async fn save(&self, settings: &QuizSettings) -> Result<(), SettingsServiceError> {
        self.repo.save_settings(settings).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::TopicFilter;
    use storage::repository::InMemoryRepository;
    fn service() -> SettingsService {
        SettingsService::new(Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn missing_settings_fall_back_to_defaults() {
        let settings = service().load().await.unwrap();
        assert_eq!(settings, QuizSettings::default());
    }

    #[tokio::test]
    async fn saved_settings_are_loaded_back() {
        let service = service();
        let mut settings = QuizSettings::default();
        settings.toggle_dark_mode();
        settings.set_selected_topic(TopicFilter::from("math"));
        service.save(&settings).await.unwrap();

        assert_eq!(service.load().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn saving_again_replaces_previous_settings() {
        let service = service();
        let mut first = QuizSettings::default();
        first.set_time_limit_minutes(5).unwrap();
        service.save(&first).await.unwrap();

        let mut second = first.clone();
        second.set_time_limit_minutes(45).unwrap();
        second.toggle_dark_mode();
        service.save(&second).await.unwrap();

        let loaded = service.load().await.unwrap();
        assert_eq!(loaded, second);
        assert_ne!(loaded, first);
    }
}
