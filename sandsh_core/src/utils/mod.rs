//! # Utility Modules
//!
//! Cross-cutting helpers shared by the library and the `sandsh` binary.
//!
//! ## Sub-modules
//!
//! - **`logging`**: Initializes the diagnostic `tracing` subscriber. Diagnostics
//!   never go to stdout, which belongs to the shell session itself.

pub mod logging;
