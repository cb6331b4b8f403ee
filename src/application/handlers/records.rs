//! RecordCommands - Write path and queries for savings records.
//!
//! Every successful mutation is committed to the store first and then
//! announced exactly once through the `ChangeNotifier`. A failed or
//! not-found mutation is never announced.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::foundation::{DomainError, ErrorCode, RecordId, ValidationError};
use crate::domain::savings::{NewRecord, Record};
use crate::ports::{ChangeNotifier, RecordStore};

/// Handler for record mutations and lookups.
pub struct RecordCommands {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl RecordCommands {
    pub fn new(store: Arc<dyn RecordStore>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn list(&self) -> Result<Vec<Record>, DomainError> {
        self.store.list_all().await
    }

    pub async fn get(&self, id: RecordId) -> Result<Record, DomainError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Records dated within `start..=end`.
    pub async fn in_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Record>, DomainError> {
        if start > end {
            return Err(ValidationError::invalid_format(
                "start_date",
                "start date must not be after end date",
            )
            .into());
        }
        self.store.find_by_date_range(start, end).await
    }

    pub async fn create(&self, fields: NewRecord) -> Result<Record, DomainError> {
        let record = self.store.create(fields).await?;
        tracing::info!(record_id = %record.id, amount = %record.amount, "Record created");

        self.notifier.announce_created(record.clone()).await;
        Ok(record)
    }

    pub async fn update(&self, id: RecordId, fields: NewRecord) -> Result<Record, DomainError> {
        let record = self
            .store
            .update(id, fields)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(record_id = %record.id, "Record updated");

        self.notifier.announce_updated(record.clone()).await;
        Ok(record)
    }

    pub async fn delete(&self, id: RecordId) -> Result<Record, DomainError> {
        let record = self.store.delete(id).await?.ok_or_else(|| not_found(id))?;
        tracing::info!(record_id = %record.id, "Record deleted");

        self.notifier.announce_deleted(record.clone()).await;
        Ok(record)
    }

    /// Deletes every record. Announces even when nothing was deleted.
    pub async fn clear(&self) -> Result<u64, DomainError> {
        let deleted = self.store.delete_all().await?;
        tracing::info!(deleted, "All records cleared");

        self.notifier.announce_cleared(deleted).await;
        Ok(deleted)
    }
}

fn not_found(id: RecordId) -> DomainError {
    DomainError::new(ErrorCode::RecordNotFound, "Record not found")
        .with_detail("id", id.to_string())
}
