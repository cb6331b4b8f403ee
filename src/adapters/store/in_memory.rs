//! In-memory RecordStore.
//!
//! Used when no database URL is configured, and by tests.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, RecordId, Timestamp};
use crate::domain::savings::{NewRecord, Record, RecordAggregate};
use crate::ports::RecordStore;

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<i64, Record>,
    last_id: i64,
}

/// Process-local record store. Identifiers start at 1 and are never reused.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records (useful for tests)
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn sorted<'a>(records: impl Iterator<Item = &'a Record>) -> Vec<Record> {
    let mut out: Vec<Record> = records.cloned().collect();
    out.sort_by_key(|r| (Reverse(r.date), Reverse(r.created_at), Reverse(r.id)));
    out
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list_all(&self) -> Result<Vec<Record>, DomainError> {
        Ok(sorted(self.state.read().await.records.values()))
    }

    async fn aggregate(&self) -> Result<RecordAggregate, DomainError> {
        let records = self.list_all().await?;
        Ok(RecordAggregate::from_records(&records))
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>, DomainError> {
        Ok(self.state.read().await.records.get(&id.as_i64()).cloned())
    }

    async fn find_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Record>, DomainError> {
        let state = self.state.read().await;
        Ok(sorted(
            state
                .records
                .values()
                .filter(|r| r.date >= start && r.date <= end),
        ))
    }

    async fn create(&self, fields: NewRecord) -> Result<Record, DomainError> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let id = state.last_id;
        let now = Timestamp::now();
        let record = Record {
            id: RecordId::new(id),
            amount: fields.amount(),
            description: fields.description().to_string(),
            date: fields.date(),
            created_at: now,
            updated_at: now,
        };
        state.records.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: RecordId, fields: NewRecord) -> Result<Option<Record>, DomainError> {
        let mut state = self.state.write().await;
        let Some(record) = state.records.get_mut(&id.as_i64()) else {
            return Ok(None);
        };
        record.amount = fields.amount();
        record.description = fields.description().to_string();
        record.date = fields.date();
        record.updated_at = Timestamp::now();
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: RecordId) -> Result<Option<Record>, DomainError> {
        Ok(self.state.write().await.records.remove(&id.as_i64()))
    }

    async fn delete_all(&self) -> Result<u64, DomainError> {
        let mut state = self.state.write().await;
        let count = state.records.len() as u64;
        state.records.clear();
        Ok(count)
    }
}
