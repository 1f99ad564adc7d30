//! FFmpeg audio extraction.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Extract the audio track of `input` into a mono 16 kHz PCM WAV at
/// `output`, the input format the speech engine requires.
///
/// Shells out to FFmpeg; the input may be any audio or video container
/// FFmpeg can read.
pub async fn extract_audio(input: impl AsRef<Path>, output: impl AsRef<Path>) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    debug!(input = %input.display(), output = %output.display(), "extracting audio");

    let result = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(input)
        .args(["-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        return Err(MediaError::conversion_failed(
            "could not extract audio from the provided file",
            Some(stderr),
            result.status.code(),
        ));
    }

    info!(output = %output.display(), "audio extraction completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_input_is_reported_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("does-not-exist.mp4");
        let output = dir.path().join("out.wav");

        let err = extract_audio(&input, &output).await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
