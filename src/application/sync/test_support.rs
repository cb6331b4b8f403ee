//! Shared fixtures for sync tests.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::foundation::{DomainError, RecordId};
use crate::domain::savings::{NewRecord, Record, RecordAggregate};
use crate::ports::RecordStore;

/// Store whose every call fails, as if the database were down.
pub struct FailingStore;

fn outage() -> DomainError {
    DomainError::database("simulated store outage")
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn list_all(&self) -> Result<Vec<Record>, DomainError> {
        Err(outage())
    }

    async fn aggregate(&self) -> Result<RecordAggregate, DomainError> {
        Err(outage())
    }

    async fn find_by_id(&self, _id: RecordId) -> Result<Option<Record>, DomainError> {
        Err(outage())
    }

    async fn find_by_date_range(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<Record>, DomainError> {
        Err(outage())
    }

    async fn create(&self, _fields: NewRecord) -> Result<Record, DomainError> {
        Err(outage())
    }

    async fn update(&self, _id: RecordId, _fields: NewRecord) -> Result<Option<Record>, DomainError> {
        Err(outage())
    }

    async fn delete(&self, _id: RecordId) -> Result<Option<Record>, DomainError> {
        Err(outage())
    }

    async fn delete_all(&self) -> Result<u64, DomainError> {
        Err(outage())
    }
}
