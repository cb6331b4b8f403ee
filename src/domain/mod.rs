//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `savings` - Contribution records and goal statistics

pub mod foundation;
pub mod savings;
