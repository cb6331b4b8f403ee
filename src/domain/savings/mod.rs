//! Savings domain - contribution records and goal statistics.

mod record;
mod statistics;

pub use record::{parse_record_date, NewRecord, Record, MAX_DESCRIPTION_LEN};
pub use statistics::{RecordAggregate, Statistics, DEFAULT_SAVINGS_GOAL};
