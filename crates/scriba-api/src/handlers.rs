//! Request handlers.

pub mod exports;
pub mod health;
pub mod jobs;
pub mod projects;
pub mod system;
