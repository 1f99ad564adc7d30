//! Durable transcript store on SQLite.
//!
//! The single source of truth for projects and their segments after a job
//! finishes. Every operation is its own short transaction; a crash between
//! two calls leaves the store at the last checkpoint, never torn inside
//! one.

pub mod database;
pub mod error;
pub mod schema;
pub mod store;

pub use database::Database;
pub use error::{StoreError, StoreResult};
pub use store::TranscriptStore;
