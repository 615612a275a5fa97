//! # Sandbox Materialization
//!
//! Expands a packaged zip archive into a fresh private directory that becomes
//! the sandbox root for one session. The directory lives as long as the
//! [`SandboxRoot`] value and is removed when it is dropped.
//!
//! ## Security Model
//!
//! The root is canonicalized once at creation and never changes. Archive entry
//! names are checked with `enclosed_name()`, so an entry such as
//! `../../etc/passwd` is rejected instead of being written outside the root.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};
use zip::ZipArchive;

/// Errors specific to sandbox materialization
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Failed to open archive '{path}': {source}")]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read archive '{path}': {source}")]
    ReadArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Archive entry '{0}' would be extracted outside the sandbox root")]
    UnsafeEntry(String),

    #[error("Failed to create sandbox directory: {0}")]
    CreateRoot(#[source] io::Error),

    #[error("Failed to extract '{entry}': {source}")]
    Extract {
        entry: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to canonicalize sandbox root '{path}': {reason}")]
    CanonicalizationFailed { path: PathBuf, reason: String },
}

/// A private directory tree backing one session.
#[derive(Debug)]
pub struct SandboxRoot {
    path: PathBuf,
    _dir: TempDir,
}

impl SandboxRoot {
    /// Creates an empty sandbox root.
    pub fn empty() -> Result<Self, SandboxError> {
        let dir = tempfile::Builder::new()
            .prefix("sandsh-")
            .tempdir()
            .map_err(SandboxError::CreateRoot)?;
        let path = fs::canonicalize(dir.path()).map_err(|e| {
            SandboxError::CanonicalizationFailed {
                path: dir.path().to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { path, _dir: dir })
    }

    /// Creates a sandbox root holding the contents of the zip archive at
    /// `archive`.
    pub fn from_archive(archive: &Path) -> Result<Self, SandboxError> {
        let root = Self::empty()?;
        let count = extract_zip(archive, root.path())?;
        info!(
            archive = %archive.display(),
            root = %root.path().display(),
            entries = count,
            "materialized sandbox"
        );
        Ok(root)
    }

    /// Canonical real path of the root.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Extracts every entry of `archive` below `destination`, returning the entry
/// count.
pub fn extract_zip(archive: &Path, destination: &Path) -> Result<usize, SandboxError> {
    let file = File::open(archive).map_err(|source| SandboxError::OpenArchive {
        path: archive.to_path_buf(),
        source,
    })?;
    let mut zip = ZipArchive::new(file).map_err(|source| SandboxError::ReadArchive {
        path: archive.to_path_buf(),
        source,
    })?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|source| SandboxError::ReadArchive {
                path: archive.to_path_buf(),
                source,
            })?;
        let name = entry.name().to_string();
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| SandboxError::UnsafeEntry(name.clone()))?;
        let outpath = destination.join(relative);
        let extract_err = |source| SandboxError::Extract {
            entry: name.clone(),
            source,
        };

        if entry.is_dir() {
            fs::create_dir_all(&outpath).map_err(extract_err)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent).map_err(extract_err)?;
            }
            let mut outfile = File::create(&outpath).map_err(extract_err)?;
            io::copy(&mut entry, &mut outfile).map_err(extract_err)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode & 0o7777))
                    .map_err(extract_err)?;
            }
        }
        debug!(entry = %name, "extracted");
    }

    Ok(zip.len())
}
