//! Error taxonomy for shell commands.
//!
//! Every variant renders as a single diagnostic line that names the failing
//! command and the operand as the user typed it. Real sandbox paths never
//! appear in messages.

use std::io;

/// Errors signalled by command handlers.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("{command}: '{path}' does not exist")]
    PathNotFound { command: &'static str, path: String },

    #[error("{command}: {reason}")]
    InvalidArgument {
        command: &'static str,
        reason: String,
    },

    #[error("{command}: destination '{path}' exists and is not a directory")]
    DestinationConflict { command: &'static str, path: String },

    #[error("{command}: '{path}': {source}")]
    Io {
        command: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}: command not found")]
    UnknownCommand(String),
}

impl ShellError {
    pub fn not_found(command: &'static str, path: impl Into<String>) -> Self {
        ShellError::PathNotFound {
            command,
            path: path.into(),
        }
    }

    pub fn invalid(command: &'static str, reason: impl Into<String>) -> Self {
        ShellError::InvalidArgument {
            command,
            reason: reason.into(),
        }
    }

    pub fn usage(command: &'static str, usage: &str) -> Self {
        Self::invalid(command, format!("usage: {usage}"))
    }

    /// Wraps an I/O failure, keeping the original error as the source.
    pub fn io(command: &'static str, path: impl Into<String>, source: io::Error) -> Self {
        ShellError::Io {
            command,
            path: path.into(),
            source,
        }
    }
}
