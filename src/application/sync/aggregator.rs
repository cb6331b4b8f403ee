//! Statistics aggregator.
//!
//! Recomputes statistics from the store on every call. There is no cache:
//! callers run it right after a mutation and need the post-commit view.

use std::sync::Arc;

use crate::domain::foundation::{Amount, DomainError};
use crate::domain::savings::Statistics;
use crate::ports::RecordStore;

pub struct StatisticsAggregator {
    store: Arc<dyn RecordStore>,
    goal: Amount,
}

impl StatisticsAggregator {
    pub fn new(store: Arc<dyn RecordStore>, goal: Amount) -> Self {
        Self { store, goal }
    }

    pub fn goal(&self) -> Amount {
        self.goal
    }

    /// Reads the current aggregate and derives the goal metrics.
    pub async fn compute(&self) -> Result<Statistics, DomainError> {
        let aggregate = self.store.aggregate().await?;
        Ok(Statistics::derive(&aggregate, self.goal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::InMemoryRecordStore;
    use crate::domain::savings::{NewRecord, DEFAULT_SAVINGS_GOAL};
    use chrono::NaiveDate;

    fn fields(units: f64) -> NewRecord {
        NewRecord::new(units, "deposit", NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn compute_on_empty_store_is_all_zero() {
        let store = Arc::new(InMemoryRecordStore::new());
        let aggregator = StatisticsAggregator::new(store, DEFAULT_SAVINGS_GOAL);

        let stats = aggregator.compute().await.unwrap();
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.total_value, Amount::ZERO);
        assert_eq!(stats.progress_percentage, 0.0);
        assert_eq!(stats.remaining, DEFAULT_SAVINGS_GOAL);
    }

    #[tokio::test]
    async fn compute_reflects_latest_writes() {
        let store = Arc::new(InMemoryRecordStore::new());
        let aggregator = StatisticsAggregator::new(store.clone(), DEFAULT_SAVINGS_GOAL);

        store.create(fields(5000.0)).await.unwrap();
        store.create(fields(1500.0)).await.unwrap();
        let stats = aggregator.compute().await.unwrap();
        assert_eq!(stats.remaining, Amount::from_cents(350_000));
        assert_eq!(stats.progress_percentage, 65.0);

        store.delete_all().await.unwrap();
        let stats = aggregator.compute().await.unwrap();
        assert_eq!(stats.total_count, 0);
    }

    #[tokio::test]
    async fn custom_goal_is_used() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.create(fields(50.0)).await.unwrap();
        let aggregator = StatisticsAggregator::new(store, Amount::from_cents(20_000));

        let stats = aggregator.compute().await.unwrap();
        assert_eq!(stats.progress_percentage, 25.0);
    }
}
