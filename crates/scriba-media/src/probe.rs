//! GPU and disk capability probing.

use std::path::Path;
use std::process::Stdio;

use serde::Serialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::MediaResult;

/// GPU availability and memory, as reported by `nvidia-smi`.
#[derive(Debug, Clone, Serialize)]
pub struct GpuInfo {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub vram_total_mb: u64,
    pub vram_free_mb: u64,
}

impl GpuInfo {
    fn unavailable() -> Self {
        Self {
            available: false,
            name: None,
            vram_total_mb: 0,
            vram_free_mb: 0,
        }
    }
}

/// Probe the first GPU via `nvidia-smi`.
///
/// A missing binary or an unparsable reply both mean "no GPU"; probing
/// never fails the caller.
pub async fn probe_gpu() -> GpuInfo {
    if which::which("nvidia-smi").is_err() {
        return GpuInfo::unavailable();
    }

    let output = Command::new("nvidia-smi")
        .args([
            "--query-gpu=name,memory.total,memory.free",
            "--format=csv,noheader,nounits",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await;

    let output = match output {
        Ok(o) if o.status.success() => o,
        _ => return GpuInfo::unavailable(),
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    match parse_nvidia_smi_line(stdout.lines().next().unwrap_or_default()) {
        Some(info) => info,
        None => {
            debug!("unparsable nvidia-smi output");
            GpuInfo::unavailable()
        }
    }
}

fn parse_nvidia_smi_line(line: &str) -> Option<GpuInfo> {
    let mut parts = line.split(',').map(str::trim);
    let name = parts.next()?;
    if name.is_empty() {
        return None;
    }
    let total: u64 = parts.next()?.parse().ok()?;
    let free: u64 = parts.next()?.parse().ok()?;
    Some(GpuInfo {
        available: true,
        name: Some(name.to_string()),
        vram_total_mb: total,
        vram_free_mb: free,
    })
}

/// Device and compute type selected for a given VRAM budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DevicePick {
    pub device: &'static str,
    pub compute: &'static str,
}

/// Select device and compute type from the available VRAM.
///
/// Under 4 GB the GPU is not worth it; under 8 GB the quantized int8 path
/// fits; above that, float16.
pub fn pick_device(vram_total_mb: u64) -> DevicePick {
    if vram_total_mb < 4096 {
        DevicePick {
            device: "cpu",
            compute: "float32",
        }
    } else if vram_total_mb < 8192 {
        DevicePick {
            device: "cuda",
            compute: "int8",
        }
    } else {
        DevicePick {
            device: "cuda",
            compute: "float16",
        }
    }
}

/// Total and free bytes of the volume holding `path`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

/// Disk capacity of the volume containing `path`.
///
/// Picks the mounted disk with the longest mount-point prefix of `path`.
pub fn disk_usage(path: &Path) -> MediaResult<DiskUsage> {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let disks = sysinfo::Disks::new_with_refreshed_list();

    let best = disks
        .list()
        .iter()
        .filter(|d| path.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len());

    Ok(match best {
        Some(disk) => DiskUsage {
            total_bytes: disk.total_space(),
            free_bytes: disk.available_space(),
        },
        None => DiskUsage {
            total_bytes: 0,
            free_bytes: 0,
        },
    })
}
