//! Recursive, metadata-preserving copy confined to the sandbox.
//!
//! Files keep their permission bits (via `std::fs::copy`) and their access and
//! modification times. Directory recursion tracks the canonical directories on
//! the current descent path, so a link back to an ancestor is reported instead
//! of looping, and the depth is capped at [`MAX_COPY_DEPTH`]. Links that
//! resolve outside the sandbox root are never followed, and a file is never
//! copied onto itself.

use std::collections::HashSet;
use std::fs::{self, FileTimes, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const MAX_COPY_DEPTH: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("destination '{0}' exists and is not a directory")]
    DestinationConflict(String),

    #[error("cannot copy directory '{0}' into itself")]
    IntoItself(String),

    #[error("'{0}' and its destination are the same file")]
    SameFile(String),

    #[error("directory cycle detected at '{0}'")]
    Cycle(String),

    #[error("directory nesting deeper than {MAX_COPY_DEPTH} levels at '{0}'")]
    TooDeep(String),

    #[error("'{0}' links outside the sandbox")]
    OutsideSandbox(String),

    #[error("'{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Copies real paths below a sandbox root.
pub struct Copier {
    root: PathBuf,
    canonical_root: PathBuf,
    ancestors: HashSet<PathBuf>,
}

impl Copier {
    pub fn new(root: &Path) -> io::Result<Self> {
        Ok(Self {
            root: root.to_path_buf(),
            canonical_root: fs::canonicalize(root)?,
            ancestors: HashSet::new(),
        })
    }

    /// Copies `source` to `destination`.
    ///
    /// A directory source is copied recursively into `destination`, which is
    /// created if absent. A file source lands inside `destination` when that is
    /// an existing directory, otherwise at `destination` itself with any
    /// missing parent directories created.
    pub fn copy(&mut self, source: &Path, destination: &Path) -> Result<(), CopyError> {
        let metadata = fs::metadata(source).map_err(|e| self.io(source, e))?;
        self.ensure_inside(source)?;

        if metadata.is_dir() {
            if destination.exists() && !destination.is_dir() {
                return Err(CopyError::DestinationConflict(self.display(destination)));
            }
            if self.lands_inside(source, destination)? {
                return Err(CopyError::IntoItself(self.display(source)));
            }
            fs::create_dir_all(destination).map_err(|e| self.io(destination, e))?;
            self.copy_dir(source, destination, 0)
        } else {
            let target = match source.file_name() {
                Some(name) if destination.is_dir() => destination.join(name),
                _ => destination.to_path_buf(),
            };
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| self.io(parent, e))?;
            }
            self.copy_file(source, &metadata, &target)
        }
    }

    fn copy_dir(&mut self, source: &Path, destination: &Path, depth: usize) -> Result<(), CopyError> {
        if depth >= MAX_COPY_DEPTH {
            return Err(CopyError::TooDeep(self.display(source)));
        }

        let canonical = self.ensure_inside(source)?;
        if !self.ancestors.insert(canonical.clone()) {
            return Err(CopyError::Cycle(self.display(source)));
        }

        let result = self.copy_entries(source, destination, depth);
        self.ancestors.remove(&canonical);
        result
    }

    fn copy_entries(&mut self, source: &Path, destination: &Path, depth: usize) -> Result<(), CopyError> {
        let mut entries = fs::read_dir(source)
            .map_err(|e| self.io(source, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.io(source, e))?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let item_source = entry.path();
            let item_destination = destination.join(entry.file_name());
            let metadata = fs::metadata(&item_source).map_err(|e| self.io(&item_source, e))?;

            if metadata.is_dir() {
                if item_destination.exists() && !item_destination.is_dir() {
                    return Err(CopyError::DestinationConflict(
                        self.display(&item_destination),
                    ));
                }
                fs::create_dir_all(&item_destination)
                    .map_err(|e| self.io(&item_destination, e))?;
                self.copy_dir(&item_source, &item_destination, depth + 1)?;
            } else {
                self.ensure_inside(&item_source)?;
                self.copy_file(&item_source, &metadata, &item_destination)?;
            }
        }
        Ok(())
    }

    fn copy_file(&self, source: &Path, metadata: &Metadata, destination: &Path) -> Result<(), CopyError> {
        // `fs::copy` truncates the destination before reading the source.
        if destination.exists() && self.canonical(source)? == self.canonical(destination)? {
            return Err(CopyError::SameFile(self.display(source)));
        }
        fs::copy(source, destination).map_err(|e| self.io(source, e))?;
        debug!(from = %self.display(source), to = %self.display(destination), "copied file");
        preserve_times(metadata, destination);
        Ok(())
    }

    /// Whether `destination`, once its existing prefix is resolved through any
    /// links, lies at or below `source`.
    fn lands_inside(&self, source: &Path, destination: &Path) -> Result<bool, CopyError> {
        if destination.starts_with(source) {
            return Ok(true);
        }
        let Some(existing) = destination.ancestors().find(|p| p.exists()) else {
            return Ok(false);
        };
        Ok(self.canonical(existing)?.starts_with(self.canonical(source)?))
    }

    fn canonical(&self, path: &Path) -> Result<PathBuf, CopyError> {
        fs::canonicalize(path).map_err(|e| self.io(path, e))
    }

    /// Canonical form of `path`, rejected if it leaves the sandbox.
    fn ensure_inside(&self, path: &Path) -> Result<PathBuf, CopyError> {
        let canonical = self.canonical(path)?;
        if canonical.starts_with(&self.canonical_root) {
            Ok(canonical)
        } else {
            Err(CopyError::OutsideSandbox(self.display(path)))
        }
    }

    /// Virtual rendering of a real path below the root.
    fn display(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(relative) => {
                let segments: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                format!("/{}", segments.join("/"))
            }
            Err(_) => path.display().to_string(),
        }
    }

    fn io(&self, path: &Path, source: io::Error) -> CopyError {
        CopyError::Io {
            path: self.display(path),
            source,
        }
    }
}

/// Carries access and modification times over to `destination`.
///
/// Platforms or filesystems that cannot set times still get the copied bytes
/// and permissions; the lost timestamps are logged.
fn preserve_times(metadata: &Metadata, destination: &Path) {
    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }

    #[cfg(unix)]
    let file = fs::File::open(destination);
    #[cfg(not(unix))]
    let file = fs::OpenOptions::new().write(true).open(destination);

    if let Err(e) = file.and_then(|f| f.set_times(times)) {
        warn!(
            path = %destination.display(),
            error = %e,
            "timestamps not preserved"
        );
    }
}
