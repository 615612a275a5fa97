//! Rendering helpers for `ls`.

use chrono::{DateTime, Local};
use std::fs::Metadata;
use std::time::SystemTime;

const SIZE_UNITS: [&str; 5] = ["B", "K", "M", "G", "T"];

/// Binary-scaled size with one decimal place, e.g. `1536 -> "1.5K"`.
///
/// Each step divides by 1024; anything past terabytes is shown in `P`.
pub fn human_readable(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in SIZE_UNITS {
        if size < 1024.0 {
            return format!("{size:.1}{unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1}P")
}

/// Permission bits as three octal digits, e.g. `755`.
pub fn permission_bits(metadata: &Metadata) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o777
    }
    #[cfg(not(unix))]
    {
        let base = if metadata.is_dir() { 0o755 } else { 0o644 };
        if metadata.permissions().readonly() {
            base & !0o222
        } else {
            base
        }
    }
}

/// Local time formatted as `YYYY-MM-DD HH:MM:SS`.
pub fn timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// One `ls -l` line: `MODE SIZE MTIME NAME`.
pub fn long_entry(name: &str, metadata: &Metadata, human: bool) -> String {
    let size = if human {
        human_readable(metadata.len())
    } else {
        format!("{}B", metadata.len())
    };
    let mtime = metadata
        .modified()
        .map(timestamp)
        .unwrap_or_else(|_| "-".to_string());
    format!(
        "{:03o} {} {} {}",
        permission_bits(metadata),
        size,
        mtime,
        name
    )
}
