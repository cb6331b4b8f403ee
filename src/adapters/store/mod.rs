//! Record store adapters.
//!
//! - `InMemoryRecordStore` - Process-local store for development and tests
//!
//! The PostgreSQL store lives in `adapters::postgres`.

mod in_memory;

pub use in_memory::InMemoryRecordStore;
