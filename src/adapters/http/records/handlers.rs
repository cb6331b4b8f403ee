//! HTTP handlers for record endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::sync::StatisticsAggregator;
use crate::application::RecordCommands;
use crate::domain::foundation::{DomainError, ErrorCode, RecordId};
use crate::domain::savings::parse_record_date;

use super::dto::{
    ClearedResponse, DateRangeQuery, DeletedRecordResponse, ErrorResponse, RecordRequest,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct RecordHandlers {
    commands: Arc<RecordCommands>,
    aggregator: Arc<StatisticsAggregator>,
}

impl RecordHandlers {
    pub fn new(commands: Arc<RecordCommands>, aggregator: Arc<StatisticsAggregator>) -> Self {
        Self {
            commands,
            aggregator,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/records - List all records
pub async fn list_records(State(handlers): State<RecordHandlers>) -> Response {
    match handlers.commands.list().await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => handle_domain_error(e),
    }
}

/// GET /api/records/statistics - Current statistics and goal progress
pub async fn get_statistics(State(handlers): State<RecordHandlers>) -> Response {
    match handlers.aggregator.compute().await {
        Ok(statistics) => (StatusCode::OK, Json(statistics)).into_response(),
        Err(e) => handle_domain_error(e),
    }
}

/// GET /api/records/date-range?start_date=&end_date= - Records within dates
pub async fn list_by_date_range(
    State(handlers): State<RecordHandlers>,
    Query(query): Query<DateRangeQuery>,
) -> Response {
    let (Some(start), Some(end)) = (query.start_date, query.end_date) else {
        return bad_request("start_date and end_date are required");
    };

    let range = parse_record_date(&start).and_then(|s| parse_record_date(&end).map(|e| (s, e)));
    let (start, end) = match range {
        Ok(range) => range,
        Err(e) => return validation_error(&e),
    };

    match handlers.commands.in_date_range(start, end).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => handle_domain_error(e),
    }
}

/// GET /api/records/:id - Get one record
pub async fn get_record(
    State(handlers): State<RecordHandlers>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.commands.get(id).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => handle_domain_error(e),
    }
}

/// POST /api/records - Create a record
pub async fn create_record(
    State(handlers): State<RecordHandlers>,
    body: Result<Json<RecordRequest>, JsonRejection>,
) -> Response {
    let fields = match body {
        Ok(Json(req)) => match req.into_fields() {
            Ok(fields) => fields,
            Err(e) => return validation_error(&e),
        },
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match handlers.commands.create(fields).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => handle_domain_error(e),
    }
}

/// PUT /api/records/:id - Replace a record's fields
pub async fn update_record(
    State(handlers): State<RecordHandlers>,
    Path(id): Path<String>,
    body: Result<Json<RecordRequest>, JsonRejection>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let fields = match body {
        Ok(Json(req)) => match req.into_fields() {
            Ok(fields) => fields,
            Err(e) => return validation_error(&e),
        },
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match handlers.commands.update(id, fields).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => handle_domain_error(e),
    }
}

/// DELETE /api/records/:id - Delete a record
pub async fn delete_record(
    State(handlers): State<RecordHandlers>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.commands.delete(id).await {
        Ok(record) => {
            let response = DeletedRecordResponse {
                message: "Record deleted successfully".to_string(),
                record,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_domain_error(e),
    }
}

/// DELETE /api/records/clear - Delete every record
pub async fn clear_records(State(handlers): State<RecordHandlers>) -> Response {
    match handlers.commands.clear().await {
        Ok(deleted_count) => {
            let response = ClearedResponse {
                message: "All records deleted successfully".to_string(),
                deleted_count,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_domain_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn parse_id(raw: &str) -> Result<RecordId, Response> {
    raw.parse::<RecordId>()
        .map_err(|_| bad_request("Record ID must be a valid integer"))
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::bad_request(message))).into_response()
}

fn validation_error(err: &crate::domain::foundation::ValidationError) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::validation(err))).into_response()
}

fn handle_domain_error(error: DomainError) -> Response {
    let status = match error.code {
        ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorCode::RecordNotFound => StatusCode::NOT_FOUND,
        ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::DatabaseError | ErrorCode::InternalError => {
            tracing::error!("Record request failed: {}", error);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("Internal server error")),
            )
                .into_response();
        }
    };

    (status, Json(ErrorResponse::from(&error))).into_response()
}
