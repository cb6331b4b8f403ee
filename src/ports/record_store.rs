//! RecordStore port - Interface to the backing store of savings records.
//!
//! The synchronization core only reads through `list_all` and `aggregate`;
//! the write path uses the remaining operations.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::foundation::{DomainError, RecordId};
use crate::domain::savings::{NewRecord, Record, RecordAggregate};

/// Port for persisting and querying savings records.
///
/// Implementations assign identifiers and created/updated timestamps.
/// All reads return owned snapshots; callers never hold store locks.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records, newest date first, then newest creation first.
    async fn list_all(&self) -> Result<Vec<Record>, DomainError>;

    /// Count, sum, min, max and date bounds over every record.
    async fn aggregate(&self) -> Result<RecordAggregate, DomainError>;

    async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>, DomainError>;

    /// Records whose date falls in `start..=end`, same ordering as `list_all`.
    async fn find_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Record>, DomainError>;

    async fn create(&self, fields: NewRecord) -> Result<Record, DomainError>;

    /// Replaces the fields of an existing record.
    ///
    /// Returns `None` if no record has that id.
    async fn update(&self, id: RecordId, fields: NewRecord) -> Result<Option<Record>, DomainError>;

    /// Deletes a record and returns it as it was.
    async fn delete(&self, id: RecordId) -> Result<Option<Record>, DomainError>;

    /// Deletes every record, returning how many were removed.
    async fn delete_all(&self) -> Result<u64, DomainError>;
}
