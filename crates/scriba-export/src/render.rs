//! Format renderers.
//!
//! Each renderer takes segments ordered by start time and produces its
//! output without consulting the clock, locale or any other ambient state.

use serde::Serialize;

use scriba_models::timecode::{format_timecode, seconds_to_ms, TimecodeStyle};
use scriba_models::Segment;

use crate::format::{ExportFormat, ExportOptions};

/// Render segments in the given format.
pub fn render(format: ExportFormat, segments: &[Segment], opts: &ExportOptions) -> String {
    match format {
        ExportFormat::Srt => generate_srt(segments, opts.speaker_labels),
        ExportFormat::Vtt => generate_vtt(segments, opts.speaker_labels),
        ExportFormat::Txt => generate_txt(segments, opts.speaker_labels),
        ExportFormat::Csv => generate_csv(segments, opts.speaker_labels),
        ExportFormat::Json => generate_json(segments),
        ExportFormat::Context => generate_context(segments, &opts.source_name),
    }
}

/// SubRip: numbered cue blocks separated by blank lines.
pub fn generate_srt(segments: &[Segment], speaker_labels: bool) -> String {
    let blocks: Vec<String> = segments
        .iter()
        .enumerate()
        .map(|(i, seg)| {
            let start = format_timecode(seconds_to_ms(seg.start), TimecodeStyle::Standard);
            let end = format_timecode(seconds_to_ms(seg.end), TimecodeStyle::Standard);
            let prefix = if speaker_labels && !seg.speaker.is_empty() {
                format!("[{}]: ", seg.speaker)
            } else {
                String::new()
            };
            format!("{}\n{} --> {}\n{}{}\n", i + 1, start, end, prefix, seg.text.trim())
        })
        .collect();

    blocks.join("\n")
}

/// WebVTT: `WEBVTT` header line, then cue blocks.
pub fn generate_vtt(segments: &[Segment], speaker_labels: bool) -> String {
    let mut blocks = vec!["WEBVTT\n".to_string()];

    for seg in segments {
        let start = format_timecode(seconds_to_ms(seg.start), TimecodeStyle::Web);
        let end = format_timecode(seconds_to_ms(seg.end), TimecodeStyle::Web);
        let prefix = if speaker_labels && !seg.speaker.is_empty() {
            format!("<{}> ", seg.speaker)
        } else {
            String::new()
        };
        blocks.push(format!("{} --> {}\n{}{}\n", start, end, prefix, seg.text.trim()));
    }

    blocks.join("\n")
}

/// Plain text: a `[speaker]:` header only when the speaker changes.
pub fn generate_txt(segments: &[Segment], speaker_labels: bool) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current_speaker: Option<&str> = None;

    for seg in segments {
        if speaker_labels && current_speaker != Some(seg.speaker.as_str()) {
            lines.push(format!("\n[{}]:", seg.speaker));
            current_speaker = Some(seg.speaker.as_str());
        }
        lines.push(seg.text.trim().to_string());
    }

    lines.join("\n").trim().to_string()
}

/// CSV: header row plus one row per segment, web-style timecodes.
pub fn generate_csv(segments: &[Segment], speaker_labels: bool) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if speaker_labels {
        // Header rows never fail on an in-memory writer
        let _ = writer.write_record(["Start", "End", "Speaker", "Text"]);
    } else {
        let _ = writer.write_record(["Start", "End", "Text"]);
    }

    for seg in segments {
        let start = format_timecode(seconds_to_ms(seg.start), TimecodeStyle::Web);
        let end = format_timecode(seconds_to_ms(seg.end), TimecodeStyle::Web);
        let text = seg.text.trim();
        if speaker_labels {
            let _ = writer.write_record([start.as_str(), end.as_str(), &seg.speaker, text]);
        } else {
            let _ = writer.write_record([start.as_str(), end.as_str(), text]);
        }
    }

    let bytes = writer.into_inner().unwrap_or_default();
    String::from_utf8(bytes).unwrap_or_default()
}

#[derive(Serialize)]
struct JsonExport<'a> {
    segments: &'a [Segment],
}

/// Structured JSON: the full ordered segment array, stable key order,
/// non-ASCII text passed through unescaped.
pub fn generate_json(segments: &[Segment]) -> String {
    serde_json::to_string_pretty(&JsonExport { segments }).unwrap_or_default()
}

#[derive(Serialize)]
struct ContextMetadata<'a> {
    source: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    segments_count: usize,
    total_characters: usize,
}

#[derive(Serialize)]
struct ContextExport<'a> {
    context_version: &'static str,
    metadata: ContextMetadata<'a>,
    text: String,
}

/// Machine-context interchange format.
///
/// Deliberately excludes the segment array: the payload is the trimmed
/// segment texts joined by single spaces, plus a metadata block describing
/// it.
pub fn generate_context(segments: &[Segment], source_name: &str) -> String {
    let text = segments
        .iter()
        .map(|seg| seg.text.trim())
        .collect::<Vec<_>>()
        .join(" ");

    let export = ContextExport {
        context_version: "1.0",
        metadata: ContextMetadata {
            source: source_name,
            kind: "transcription",
            segments_count: segments.len(),
            total_characters: text.chars().count(),
        },
        text,
    };

    serde_json::to_string_pretty(&export).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_segments() -> Vec<Segment> {
        vec![
            Segment::new("0", 0.0, 2.0, "Ciao a tutti."),
            Segment::new("1", 2.0, 4.0, "Questa è una prova."),
        ]
    }

    #[test]
    fn test_srt_block_count_and_indices() {
        let segs: Vec<Segment> = (0..5)
            .map(|i| Segment::new(i.to_string(), i as f64, (i + 1) as f64, format!("seg {i}")))
            .collect();
        let srt = generate_srt(&segs, false);

        let blocks: Vec<&str> = srt.split("\n\n").collect();
        assert_eq!(blocks.len(), 5);
        for (i, block) in blocks.iter().enumerate() {
            let index_line = block.lines().next().unwrap();
            assert_eq!(index_line, (i + 1).to_string());
        }
    }

    #[test]
    fn test_srt_timecodes_and_speaker_prefix() {
        let srt = generate_srt(&two_segments(), true);
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,000\n[Speaker 1]: Ciao a tutti.\n"));
        assert!(srt.contains("00:00:02,000 --> 00:00:04,000"));

        let no_labels = generate_srt(&two_segments(), false);
        assert!(!no_labels.contains("[Speaker 1]"));
    }

    #[test]
    fn test_vtt_header_and_cues() {
        let vtt = generate_vtt(&two_segments(), true);
        assert!(vtt.starts_with("WEBVTT\n\n"));
        assert!(vtt.contains("00:00:00.000 --> 00:00:02.000\n<Speaker 1> Ciao a tutti."));
    }

    #[test]
    fn test_txt_speaker_header_only_on_change() {
        let mut segs = two_segments();
        segs[1].speaker = "Speaker 2".to_string();
        segs.push(Segment {
            speaker: "Speaker 2".to_string(),
            ..Segment::new("2", 4.0, 5.0, "Ancora io.")
        });

        let txt = generate_txt(&segs, true);
        assert_eq!(
            txt,
            "[Speaker 1]:\nCiao a tutti.\n\n[Speaker 2]:\nQuesta è una prova.\nAncora io."
        );

        // One header per speaker run, not per segment
        assert_eq!(txt.matches("[Speaker 2]:").count(), 1);
    }

    #[test]
    fn test_txt_without_labels_is_just_lines() {
        let txt = generate_txt(&two_segments(), false);
        assert_eq!(txt, "Ciao a tutti.\nQuesta è una prova.");
    }

    #[test]
    fn test_csv_header_and_rows() {
        let out = generate_csv(&two_segments(), true);
        let mut lines = out.lines();
        assert_eq!(lines.next().unwrap(), "Start,End,Speaker,Text");
        assert_eq!(
            lines.next().unwrap(),
            "00:00:00.000,00:00:02.000,Speaker 1,Ciao a tutti."
        );

        let no_speaker = generate_csv(&two_segments(), false);
        assert!(no_speaker.starts_with("Start,End,Text\n"));
    }

    #[test]
    fn test_csv_quotes_embedded_commas() {
        let segs = vec![Segment::new("0", 0.0, 1.0, "uno, due, tre")];
        let out = generate_csv(&segs, false);
        assert!(out.contains("\"uno, due, tre\""));
    }

    #[test]
    fn test_json_contains_segment_array_unescaped() {
        let json = generate_json(&two_segments());
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["segments"].as_array().unwrap().len(), 2);
        // Non-ASCII text is not escaped
        assert!(json.contains("Questa è una prova."));
    }

    #[test]
    fn test_context_format_laws() {
        let json = generate_context(&two_segments(), "test.mp3");
        let data: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(data["context_version"], "1.0");
        assert_eq!(data["metadata"]["source"], "test.mp3");
        assert_eq!(data["metadata"]["type"], "transcription");
        assert_eq!(data["metadata"]["segments_count"], 2);

        let text = data["text"].as_str().unwrap();
        assert_eq!(text, "Ciao a tutti. Questa è una prova.");
        assert_eq!(
            data["metadata"]["total_characters"].as_u64().unwrap() as usize,
            text.chars().count()
        );

        // No redundant payload duplication
        assert!(data.get("segments").is_none());
        assert!(data.get("content").is_none());
    }

    #[test]
    fn test_render_dispatch_matches_direct_calls() {
        let opts = ExportOptions {
            speaker_labels: true,
            source_name: "test.mp3".to_string(),
        };
        let segs = two_segments();
        assert_eq!(render(ExportFormat::Srt, &segs, &opts), generate_srt(&segs, true));
        assert_eq!(
            render(ExportFormat::Context, &segs, &opts),
            generate_context(&segs, "test.mp3")
        );
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let segs = two_segments();
        for fmt in [
            ExportFormat::Srt,
            ExportFormat::Vtt,
            ExportFormat::Txt,
            ExportFormat::Csv,
            ExportFormat::Json,
            ExportFormat::Context,
        ] {
            let opts = ExportOptions::default();
            assert_eq!(render(fmt, &segs, &opts), render(fmt, &segs, &opts));
        }
    }
}
