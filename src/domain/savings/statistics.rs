//! Summary statistics and goal progress over the record set.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Amount;

use super::Record;

/// Default savings target, in monetary units.
pub const DEFAULT_SAVINGS_GOAL: Amount = Amount::from_cents(1_000_000);

/// Raw aggregate as produced by the store.
///
/// Numeric fields are zero, never absent, when there are no records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordAggregate {
    pub count: u64,
    pub sum: Amount,
    pub min: Amount,
    pub max: Amount,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl RecordAggregate {
    /// Folds a record slice into an aggregate.
    pub fn from_records(records: &[Record]) -> Self {
        let Some(first) = records.first() else {
            return Self::default();
        };

        let mut agg = Self {
            count: 0,
            sum: Amount::ZERO,
            min: first.amount,
            max: first.amount,
            first_date: Some(first.date),
            last_date: Some(first.date),
        };
        for record in records {
            agg.count += 1;
            agg.sum = agg.sum + record.amount;
            agg.min = agg.min.min(record.amount);
            agg.max = agg.max.max(record.amount);
            agg.first_date = agg.first_date.min(Some(record.date));
            agg.last_date = agg.last_date.max(Some(record.date));
        }
        agg
    }
}

/// Statistics pushed to viewers.
///
/// Always computed fresh; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_count: u64,
    pub total_value: Amount,
    pub average_value: f64,
    pub min_value: Amount,
    pub max_value: Amount,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub goal: Amount,
    pub remaining: Amount,
    pub progress_percentage: f64,
}

impl Statistics {
    /// Derives the viewer-facing statistics, including goal metrics.
    ///
    /// `remaining = max(goal - sum, 0)` and
    /// `progress_percentage = clamp(sum / goal * 100, 0, 100)`.
    pub fn derive(aggregate: &RecordAggregate, goal: Amount) -> Self {
        let (sum, min, max) = if aggregate.count == 0 {
            (Amount::ZERO, Amount::ZERO, Amount::ZERO)
        } else {
            (aggregate.sum, aggregate.min, aggregate.max)
        };

        let average_value = if aggregate.count == 0 {
            0.0
        } else {
            (sum.cents() as f64 / aggregate.count as f64).round() / 100.0
        };

        let progress_percentage = if goal.is_positive() {
            ((sum.cents() as f64 * 100.0) / goal.cents() as f64).clamp(0.0, 100.0)
        } else {
            100.0
        };

        Self {
            total_count: aggregate.count,
            total_value: sum,
            average_value,
            min_value: min,
            max_value: max,
            first_date: aggregate.first_date,
            last_date: aggregate.last_date,
            goal,
            remaining: goal.saturating_remaining(sum),
            progress_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{RecordId, Timestamp};
    use proptest::prelude::*;

    fn record(id: i64, cents: i64, day: u32) -> Record {
        Record {
            id: RecordId::new(id),
            amount: Amount::from_cents(cents),
            description: format!("record {}", id),
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    #[test]
    fn empty_aggregate_yields_zeroes() {
        let stats = Statistics::derive(&RecordAggregate::default(), DEFAULT_SAVINGS_GOAL);
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.total_value, Amount::ZERO);
        assert_eq!(stats.average_value, 0.0);
        assert_eq!(stats.min_value, Amount::ZERO);
        assert_eq!(stats.max_value, Amount::ZERO);
        assert_eq!(stats.remaining, DEFAULT_SAVINGS_GOAL);
        assert_eq!(stats.progress_percentage, 0.0);
        assert!(stats.first_date.is_none());
    }

    #[test]
    fn goal_metrics_for_sixty_five_percent() {
        let agg = RecordAggregate {
            count: 2,
            sum: Amount::from_cents(650_000),
            min: Amount::from_cents(150_000),
            max: Amount::from_cents(500_000),
            ..Default::default()
        };
        let stats = Statistics::derive(&agg, DEFAULT_SAVINGS_GOAL);
        assert_eq!(stats.remaining, Amount::from_cents(350_000));
        assert_eq!(stats.progress_percentage, 65.0);
        assert_eq!(stats.average_value, 3250.0);
    }

    #[test]
    fn overshooting_goal_clamps() {
        let agg = RecordAggregate {
            count: 1,
            sum: Amount::from_cents(1_500_000),
            min: Amount::from_cents(1_500_000),
            max: Amount::from_cents(1_500_000),
            ..Default::default()
        };
        let stats = Statistics::derive(&agg, DEFAULT_SAVINGS_GOAL);
        assert_eq!(stats.remaining, Amount::ZERO);
        assert_eq!(stats.progress_percentage, 100.0);
    }

    #[test]
    fn aggregate_folds_records() {
        let records = vec![record(1, 500, 10), record(2, 100, 3), record(3, 900, 20)];
        let agg = RecordAggregate::from_records(&records);
        assert_eq!(agg.count, 3);
        assert_eq!(agg.sum.cents(), 1_500);
        assert_eq!(agg.min.cents(), 100);
        assert_eq!(agg.max.cents(), 900);
        assert_eq!(agg.first_date, NaiveDate::from_ymd_opt(2026, 1, 3));
        assert_eq!(agg.last_date, NaiveDate::from_ymd_opt(2026, 1, 20));
    }

    proptest! {
        #[test]
        fn derived_statistics_stay_in_bounds(
            amounts in proptest::collection::vec(1i64..5_000_000, 0..40),
            goal_cents in 1i64..100_000_000,
        ) {
            let records: Vec<Record> = amounts
                .iter()
                .enumerate()
                .map(|(i, c)| record(i as i64 + 1, *c, (i as u32 % 28) + 1))
                .collect();
            let stats = Statistics::derive(
                &RecordAggregate::from_records(&records),
                Amount::from_cents(goal_cents),
            );

            prop_assert_eq!(stats.total_count, records.len() as u64);
            if stats.total_count == 0 {
                prop_assert_eq!(stats.total_value, Amount::ZERO);
                prop_assert_eq!(stats.average_value, 0.0);
                prop_assert_eq!(stats.min_value, Amount::ZERO);
                prop_assert_eq!(stats.max_value, Amount::ZERO);
            }
            prop_assert!((0.0..=100.0).contains(&stats.progress_percentage));
            prop_assert!(stats.remaining >= Amount::ZERO);
            prop_assert!(stats.min_value <= stats.max_value);
        }
    }
}
