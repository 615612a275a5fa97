//! Per-run session state.

use crate::path_resolver::VirtualPath;

/// Mutable state carried across the commands of a single session.
///
/// Only `cd` changes the current directory; identity and host are fixed at
/// bootstrap.
#[derive(Debug, Clone)]
pub struct Session {
    current_directory: VirtualPath,
    identity: String,
    display_host: String,
}

impl Session {
    pub fn new(identity: impl Into<String>, display_host: impl Into<String>) -> Self {
        Self {
            current_directory: VirtualPath::root(),
            identity: identity.into(),
            display_host: display_host.into(),
        }
    }

    pub fn current_directory(&self) -> &VirtualPath {
        &self.current_directory
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub(crate) fn set_current_directory(&mut self, path: VirtualPath) {
        self.current_directory = path;
    }

    /// Prompt shown before each input line, e.g. `user@host:/dir1$ `.
    pub fn prompt(&self) -> String {
        format!(
            "{}@{}:{}$ ",
            self.identity, self.display_host, self.current_directory
        )
    }
}
