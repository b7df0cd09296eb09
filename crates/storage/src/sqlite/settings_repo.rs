use async_trait::async_trait;

use crate::repository::{SettingsRepository, StorageError};
use quiz_core::model::QuizSettings;

use super::SqliteRepository;
use super::mapping::map_settings_row;

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn get_settings(&self) -> Result<Option<QuizSettings>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                dark_mode,
                timer_enabled,
                time_limit_minutes,
                shuffle_questions,
                shuffle_answers,
                selected_topic
            FROM quiz_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        map_settings_row(&row).map(Some)
    }

    async fn save_settings(&self, settings: &QuizSettings) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO quiz_settings (
                id,
                dark_mode,
                timer_enabled,
                time_limit_minutes,
                shuffle_questions,
                shuffle_answers,
                selected_topic
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                dark_mode = excluded.dark_mode,
                timer_enabled = excluded.timer_enabled,
                time_limit_minutes = excluded.time_limit_minutes,
                shuffle_questions = excluded.shuffle_questions,
                shuffle_answers = excluded.shuffle_answers,
                selected_topic = excluded.selected_topic
            ",
        )
        .bind(1_i64)
        .bind(settings.dark_mode())
        .bind(settings.timer_enabled())
        .bind(i64::from(settings.time_limit_minutes()))
        .bind(settings.shuffle_questions())
        .bind(settings.shuffle_answers())
        .bind(settings.selected_topic().as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
