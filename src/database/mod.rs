// Database module
// SQLite-backed document store read by the context assembler

pub mod sqlite;

pub use sqlite::*;
