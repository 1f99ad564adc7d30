//! Audio extraction and device probing.
//!
//! Wraps the external tools the transcription pipeline depends on: FFmpeg
//! for audio extraction/resampling and `nvidia-smi` for GPU capability
//! probing. Both are located on PATH at call time; neither is a build
//! dependency.

pub mod audio;
pub mod error;
pub mod probe;

pub use audio::extract_audio;
pub use error::{MediaError, MediaResult};
pub use probe::{disk_usage, pick_device, probe_gpu, DevicePick, DiskUsage, GpuInfo};
