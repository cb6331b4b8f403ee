//! Record HTTP endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{ClearedResponse, DateRangeQuery, DeletedRecordResponse, ErrorResponse, RecordRequest};
pub use handlers::RecordHandlers;
pub use routes::record_routes;
