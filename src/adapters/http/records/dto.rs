//! HTTP DTOs for record endpoints.
//!
//! Records and statistics are serialized as-is; only request bodies and
//! envelope responses need their own types.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};
use crate::domain::savings::{parse_record_date, NewRecord, Record};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Body of create and update requests.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordRequest {
    pub amount: f64,
    pub description: String,
    pub date: String,
}

impl RecordRequest {
    /// Validates the body into store-ready fields.
    pub fn into_fields(self) -> Result<NewRecord, ValidationError> {
        let date = parse_record_date(&self.date)?;
        NewRecord::new(self.amount, self.description, date)
    }
}

/// Query string of the date-range endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct DeletedRecordResponse {
    pub message: String,
    pub record: Record,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearedResponse {
    pub message: String,
    pub deleted_count: u64,
}

/// Error response format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: format!("{} not found: {}", resource_type, id),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn validation(err: &ValidationError) -> Self {
        Self {
            code: ErrorCode::ValidationFailed.to_string(),
            message: err.to_string(),
            details: Some(serde_json::json!({ "field": err.field() })),
        }
    }
}

impl From<&DomainError> for ErrorResponse {
    fn from(err: &DomainError) -> Self {
        let details = if err.details.is_empty() {
            None
        } else {
            serde_json::to_value(&err.details).ok()
        };
        Self {
            code: err.code.to_string(),
            message: err.message.clone(),
            details,
        }
    }
}
