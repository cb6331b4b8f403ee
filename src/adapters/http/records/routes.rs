//! HTTP routes for record endpoints.

use axum::{
    routing::{delete, get},
    Router,
};

use super::handlers::{
    clear_records, create_record, delete_record, get_record, get_statistics, list_by_date_range,
    list_records, update_record, RecordHandlers,
};

/// Creates the records router. Mount it under `/api/records`.
///
/// Static segments win over `/:id`, so `clear`, `statistics` and
/// `date-range` never parse as an id.
pub fn record_routes(handlers: RecordHandlers) -> Router {
    Router::new()
        .route("/", get(list_records).post(create_record))
        .route("/statistics", get(get_statistics))
        .route("/date-range", get(list_by_date_range))
        .route("/clear", delete(clear_records))
        .route(
            "/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
        .with_state(handlers)
}
