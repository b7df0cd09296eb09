use quiz_core::model::HistoryEntry;

use super::SqliteRepository;
use super::mapping::{i64_from_usize, map_history_row};
use crate::repository::{HistoryRepository, StorageError};

#[async_trait::async_trait]
impl HistoryRepository for SqliteRepository {
    async fn append_entry(&self, entry: &HistoryEntry, cap: usize) -> Result<(), StorageError> {
        let cap = i64_from_usize("cap", cap)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
                INSERT INTO history_entries (
                    recorded_at, score_hundredths, total, correct,
                    wrong, time_spent_secs, topic
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(entry.timestamp())
        .bind(i64::from(entry.score().hundredths()))
        .bind(i64::from(entry.total_questions()))
        .bind(i64::from(entry.correct_count()))
        .bind(i64::from(entry.wrong_count()))
        .bind(entry.time_spent_secs().map(i64::from))
        .bind(entry.topic().as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
                DELETE FROM history_entries
                WHERE id NOT IN (
                    SELECT id FROM history_entries
                    ORDER BY id DESC
                    LIMIT ?1
                )
            ",
        )
        .bind(cap)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn list_entries(&self, limit: usize) -> Result<Vec<HistoryEntry>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, recorded_at, score_hundredths, total, correct,
                    wrong, time_spent_secs, topic
                FROM history_entries
                ORDER BY id DESC
                LIMIT ?1
            ",
        )
        .bind(i64_from_usize("limit", limit)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_history_row(&row)?);
        }

        Ok(out)
    }

    async fn clear_entries(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM history_entries")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
