//! Deterministic transcript export formats.
//!
//! Pure, side-effect-free rendering: given an ordered segment sequence and
//! a format selector, produce textual output that is byte-for-byte
//! identical for identical input. Six formats are supported: SubRip (srt),
//! WebVTT (vtt), plain text (txt), CSV (csv), structured JSON (json) and
//! the redundancy-free machine-context format (wire name `mcp`).

pub mod format;
pub mod render;

pub use format::{ExportFormat, ExportOptions};
pub use render::{
    generate_context, generate_csv, generate_json, generate_srt, generate_txt, generate_vtt,
    render,
};
