//! # Logging Initialization
//!
//! Centralized setup for diagnostic logging through the `tracing` ecosystem.
//! This is separate from the audit log: diagnostics describe what the program
//! did, the audit log records what the user typed.
//!
//! ## Core Functionality
//!
//! - **`init_logging()`**: Called once at the start of the application. A
//!   `std::sync::Once` guards it, so repeated calls are harmless.
//!
//! ## Logging Configuration
//!
//! 1.  **Environment Filter (`EnvFilter`)**: `RUST_LOG` wins when set. Otherwise
//!     the given level applies, with `sandsh_core` and `sandsh` at the same level.
//!
//! 2.  **File Logging (Default)**: With `log_to_file = true`, a daily rolling log
//!     file is written to the per-user cache directory (from the `directories`
//!     crate) through a non-blocking `tracing_appender` writer, without ANSI colors.
//!
//! 3.  **Stderr Logging (Opt-in)**: With `log_to_file = false`, logs go to
//!     `stderr` with ANSI colors. Stdout is never used because it carries the
//!     shell's own output.
//!
//! 4.  **Stderr Fallback**: If the cache directory cannot be determined or
//!     created, file logging falls back to stderr.

use anyhow::Result;
use directories::ProjectDirs;
use std::{io::stderr, sync::Once};
use tracing_subscriber::{EnvFilter, fmt::layer, prelude::*};

static INIT: Once = Once::new();

pub const LOG_FILE_NAME: &str = "sandsh.log";

pub fn init_test_logging() {
    init_logging("trace", false).expect("Failed to initialize test logging");
}

/// Directory that receives rolling log files, if the platform provides one.
pub fn log_directory() -> Option<std::path::PathBuf> {
    ProjectDirs::from("dev", "Sandsh", "sandsh").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Initializes the logging system.
///
/// Sets up a global tracing subscriber writing either to stderr or to a daily
/// rolling file in the project's cache directory.
pub fn init_logging(log_level: &str, log_to_file: bool) -> Result<()> {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{log_level},sandsh_core={log_level},sandsh={log_level}"))
        });

        let log_dir = if log_to_file {
            log_directory().filter(|dir| std::fs::create_dir_all(dir).is_ok())
        } else {
            None
        };

        match log_dir {
            Some(dir) => {
                let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer().with_writer(non_blocking).with_ansi(false))
                    .init();
                // The guard must live for the whole process.
                Box::leak(Box::new(guard));
            }
            None => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer().with_writer(stderr).with_ansi(true))
                    .init();
            }
        }
    });

    Ok(())
}
