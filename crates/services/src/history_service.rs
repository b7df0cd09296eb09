use std::sync::Arc;

use chrono::{DateTime, Utc};

use quiz_core::Clock;
use quiz_core::model::{HISTORY_CAP, HistoryEntry, HistoryLog};
use storage::repository::HistoryRepository;

use crate::error::{ExportError, HistoryServiceError};
use crate::export::{self, ExportDocument, ExportFormat};

/// Persistence and export facade for the attempt history.
///
/// Owns the time source used for entry and export timestamps.
#[derive(Clone)]
pub struct HistoryService {
    clock: Clock,
    repo: Arc<dyn HistoryRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn HistoryRepository>) -> Self {
        Self { clock, repo }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Load the stored log, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError::Storage` on repository failures.
    pub async fn load(&self) -> Result<HistoryLog, HistoryServiceError> {
        let entries = self.repo.list_entries(HISTORY_CAP).await?;
        Ok(HistoryLog::from_entries(entries))
    }

    /// Persist `entry` as the newest one.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError::Storage` on repository failures.
    pub async fn record(&self, entry: &HistoryEntry) -> Result<(), HistoryServiceError> {
        self.repo.append_entry(entry, HISTORY_CAP).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `HistoryServiceError::Storage` on repository failures.
    pub async fn clear(&self) -> Result<(), HistoryServiceError> {
        self.repo.clear_entries().await?;
        Ok(())
    }

    /// Render `entries` for download, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Empty` when there is nothing to export and other
    /// `ExportError`s if rendering fails.
    pub fn export(
        &self,
        format: ExportFormat,
        entries: &[HistoryEntry],
    ) -> Result<ExportDocument, HistoryServiceError> {
        if entries.is_empty() {
            return Err(ExportError::Empty.into());
        }
        Ok(export::render(format, entries, self.clock.now())?)
    }
}
