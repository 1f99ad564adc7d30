//! Shared data models for the Scriba backend.
//!
//! This crate provides Serde-serializable types for:
//! - Projects (transcription jobs) and their lifecycle status
//! - Transcript segments
//! - Timecode formatting for the export formats

pub mod project;
pub mod segment;
pub mod timecode;

// Re-export common types
pub use project::{Project, ProjectId, ProjectStatus};
pub use segment::Segment;
pub use timecode::{format_timecode, parse_timecode, TimecodeStyle};
