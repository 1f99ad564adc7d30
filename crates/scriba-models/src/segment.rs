//! Transcript segment definitions.

use serde::{Deserialize, Serialize};

/// Placeholder speaker label assigned when no diarization is performed.
pub const DEFAULT_SPEAKER: &str = "Speaker 1";

/// A time-bounded span of recognized speech.
///
/// Segments belong to exactly one project and are ordered by `start`
/// ascending on every read path and in every export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Stable ordinal ID, unique within the owning project
    pub id: String,

    /// Start offset in seconds (`0 <= start <= end`)
    pub start: f64,

    /// End offset in seconds
    pub end: f64,

    /// Recognized text, trimmed (may be empty)
    pub text: String,

    /// Speaker label; `DEFAULT_SPEAKER` when diarization is off
    pub speaker: String,

    /// Decoder confidence proxy (average log-probability)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Segment {
    /// Create a segment with the placeholder speaker and no confidence.
    pub fn new(id: impl Into<String>, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            text: text.into().trim().to_string(),
            speaker: DEFAULT_SPEAKER.to_string(),
            confidence: None,
        }
    }

    /// Duration of the segment in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Check that a segment sequence is ordered by start time ascending.
pub fn is_ordered(segments: &[Segment]) -> bool {
    segments.windows(2).all(|w| w[0].start <= w[1].start)
}
