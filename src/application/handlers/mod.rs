//! Command and query handlers.

mod records;

pub use records::RecordCommands;
