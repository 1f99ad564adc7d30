//! Export format selection.

use std::fmt;
use std::str::FromStr;

/// The supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// SubRip subtitles, `HH:MM:SS,mmm` timecodes
    Srt,
    /// WebVTT subtitles, `HH:MM:SS.mmm` timecodes
    Vtt,
    /// Plain text with speaker-change headers
    Txt,
    /// One row per segment, header row, web timecodes
    Csv,
    /// Structured JSON holding the full segment array
    Json,
    /// Machine-context interchange format: metadata plus a single
    /// concatenated text field, no segment array
    Context,
}

impl ExportFormat {
    /// Wire name used by the export API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Srt => "srt",
            ExportFormat::Vtt => "vtt",
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Context => "mcp",
        }
    }

    /// MIME type of the rendered output.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Srt | ExportFormat::Txt => "text/plain",
            ExportFormat::Vtt => "text/vtt",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json | ExportFormat::Context => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unsupported export format name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported export format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "srt" => Ok(ExportFormat::Srt),
            "vtt" => Ok(ExportFormat::Vtt),
            "txt" => Ok(ExportFormat::Txt),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "mcp" => Ok(ExportFormat::Context),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Rendering options shared by the formats.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Include speaker labels where the format supports them
    pub speaker_labels: bool,
    /// Source file name, used by the context format's metadata block
    pub source_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            speaker_labels: true,
            source_name: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for fmt in [
            ExportFormat::Srt,
            ExportFormat::Vtt,
            ExportFormat::Txt,
            ExportFormat::Csv,
            ExportFormat::Json,
            ExportFormat::Context,
        ] {
            assert_eq!(fmt.as_str().parse::<ExportFormat>().unwrap(), fmt);
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!("docx".parse::<ExportFormat>().is_err());
        assert!("SRT".parse::<ExportFormat>().is_err());
    }
}
