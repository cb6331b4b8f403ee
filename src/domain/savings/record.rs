//! Savings record value types.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Amount, RecordId, Timestamp, ValidationError};

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// A contribution toward the savings goal, as committed by the store.
///
/// Treated as an immutable snapshot once it leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub amount: Amount,
    pub description: String,
    pub date: NaiveDate,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Validated field set for creating or replacing a record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    amount: Amount,
    description: String,
    date: NaiveDate,
}

impl NewRecord {
    /// Validates raw input.
    ///
    /// The amount is rounded to cents and must then be positive; the
    /// description is trimmed and must be 1..=255 characters.
    pub fn new(
        amount_units: f64,
        description: impl Into<String>,
        date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let amount = Amount::from_units(amount_units)?;
        if !amount.is_positive() {
            return Err(ValidationError::not_positive("amount"));
        }

        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(ValidationError::empty_field("description"));
        }
        let len = description.chars().count();
        if len > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::too_long("description", MAX_DESCRIPTION_LEN, len));
        }

        Ok(Self {
            amount,
            description,
            date,
        })
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Parses an ISO-8601 calendar date, also accepting a full RFC 3339 timestamp.
pub fn parse_record_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::empty_field("date"));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|_| ValidationError::invalid_format("date", "expected an ISO-8601 date"))
}
