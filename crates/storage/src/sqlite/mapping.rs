use quiz_core::model::{HistoryEntry, QuizSettings, QuizSettingsDraft, Score, TopicFilter};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn i64_from_usize(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_settings_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizSettings, StorageError> {
    let time_limit_minutes = u32_from_i64(
        "time_limit_minutes",
        row.try_get::<i64, _>("time_limit_minutes").map_err(ser)?,
    )?;

    let draft = QuizSettingsDraft {
        dark_mode: row.try_get("dark_mode").map_err(ser)?,
        timer_enabled: row.try_get("timer_enabled").map_err(ser)?,
        time_limit_minutes: Some(time_limit_minutes),
        shuffle_questions: row.try_get("shuffle_questions").map_err(ser)?,
        shuffle_answers: row.try_get("shuffle_answers").map_err(ser)?,
        selected_topic: row.try_get("selected_topic").map_err(ser)?,
    };

    QuizSettings::from_persisted(draft)
        .map_err(|e| ser(quiz_core::Error::from(e)))
}

pub(crate) fn map_history_row(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryEntry, StorageError> {
    let recorded_at = row.try_get("recorded_at").map_err(ser)?;
    let score = u32_from_i64(
        "score_hundredths",
        row.try_get::<i64, _>("score_hundredths").map_err(ser)?,
    )?;
    let score = Score::from_hundredths(score).map_err(|e| ser(quiz_core::Error::from(e)))?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let correct = u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?;
    let wrong = u32_from_i64("wrong", row.try_get::<i64, _>("wrong").map_err(ser)?)?;
    let time_spent = row
        .try_get::<Option<i64>, _>("time_spent_secs")
        .map_err(ser)?
        .map(|v| u32_from_i64("time_spent_secs", v))
        .transpose()?;
    let topic: String = row.try_get("topic").map_err(ser)?;

    HistoryEntry::from_persisted(
        recorded_at,
        score,
        total,
        correct,
        wrong,
        time_spent,
        TopicFilter::parse(&topic),
    )
    .map_err(|e| ser(quiz_core::Error::from(e)))
}
