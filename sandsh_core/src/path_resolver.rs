//! Virtual path normalization and sandbox containment.
//!
//! Virtual paths are normalized lexically before they are ever joined onto the
//! sandbox root. A normalized [`VirtualPath`] only holds plain segments, so the
//! resolved real path is always prefixed by the root no matter how many `..`
//! the user typed.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A normalized absolute path inside the virtual filesystem.
///
/// Always starts with `/`, never has a trailing slash (except the root itself)
/// and never contains empty, `.` or `..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualPath {
    segments: Vec<String>,
}

impl VirtualPath {
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The parent directory; the root is its own parent.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// Applies `argument` to this path the way a shell would.
    ///
    /// Absolute arguments restart from the root. `..` pops one segment and is
    /// clamped at the root.
    pub fn join(&self, argument: &str) -> Self {
        let mut stack = if argument.starts_with('/') {
            Vec::new()
        } else {
            self.segments.clone()
        };

        for segment in argument.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    stack.pop();
                }
                other => {
                    if is_plain_segment(other) {
                        stack.push(other.to_string());
                    }
                }
            }
        }

        Self { segments: stack }
    }
}

impl Default for VirtualPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// A segment must map to exactly one normal path component on the host.
/// Drive prefixes, embedded separators and the like are dropped.
fn is_plain_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Maps virtual paths onto the fixed sandbox root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Virtual path reached from `current` by `argument`.
    pub fn virtual_path(&self, current: &VirtualPath, argument: &str) -> VirtualPath {
        current.join(argument)
    }

    /// Real path for `argument` interpreted against `current`.
    pub fn resolve(&self, current: &VirtualPath, argument: &str) -> PathBuf {
        self.to_real(&current.join(argument))
    }

    pub fn to_real(&self, path: &VirtualPath) -> PathBuf {
        let mut real = self.root.clone();
        for segment in path.segments() {
            real.push(segment);
        }
        real
    }
}
