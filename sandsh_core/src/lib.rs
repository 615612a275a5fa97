//! # Sandsh Core
//!
//! Sandsh is a small interactive shell that never touches the real filesystem
//! root. A packaged archive is expanded into a private sandbox directory and
//! every command operates on that tree through a virtual path layer.
//!
//! ## Architecture & Core Concepts
//!
//! ### Virtual Paths
//!
//! Users only ever see virtual paths such as `/dir1/file.txt`. The
//! [`path_resolver::PathResolver`] maps them lexically onto the sandbox root,
//! so `..` can never climb above it regardless of what the real filesystem
//! contains.
//!
//! ### Explicit Session State
//!
//! The current directory and identity live in a [`session::Session`] value
//! that is handed to the [`engine::CommandEngine`] for each command. There is
//! no ambient global state.
//!
//! ### Typed Errors, Single Reporter
//!
//! Command handlers return `Result<Outcome, ShellError>`. The session host in
//! [`shell`] is the only place that renders errors for the user, which keeps
//! the session interactive after any failure.
//!
//! ## Modules
//!
//! - **`path_resolver`**: virtual path normalization and sandbox containment.
//! - **`session`**: per-run state (current directory, identity, host).
//! - **`command`**: exact-token parsing of input lines.
//! - **`engine`**: command semantics (`ls`, `cd`, `whoami`, `chmod`, `cp`, `exit`).
//! - **`copy`**: recursive, metadata-preserving copy with cycle guards.
//! - **`format`**: `ls` line rendering and human-readable sizes.
//! - **`audit`**: the append-only command log.
//! - **`config`**: shell descriptor loading.
//! - **`sandbox`**: archive materialization into a private root.
//! - **`shell`**: the read-eval-print host tying everything together.

pub mod audit;
pub mod command;
pub mod config;
pub mod copy;
pub mod engine;
pub mod error;
pub mod format;
pub mod path_resolver;
pub mod sandbox;
pub mod session;
pub mod shell;
pub mod utils;

pub use engine::{CommandEngine, Outcome};
pub use error::ShellError;
pub use session::Session;
pub use shell::Shell;
