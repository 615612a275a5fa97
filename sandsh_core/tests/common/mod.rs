//! Shared fixtures for sandsh_core integration tests.
#![allow(dead_code)]

use sandsh_core::audit::{AuditError, LogRecord, LogSink};
use sandsh_core::path_resolver::PathResolver;
use sandsh_core::sandbox::SandboxRoot;
use sandsh_core::{CommandEngine, Session};
use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

/// A sandbox laid out like a freshly extracted archive:
///
/// ```text
/// /dir1/
/// /dir2/
/// /file1.txt   "Test file 1"
/// /file2.txt   "Test file 2"
/// ```
pub struct Fixture {
    pub root: SandboxRoot,
    pub engine: CommandEngine,
    pub session: Session,
}

impl Fixture {
    pub fn new() -> Self {
        let root = SandboxRoot::empty().expect("Failed to create sandbox root");
        let base = root.path();
        fs::create_dir(base.join("dir1")).unwrap();
        fs::create_dir(base.join("dir2")).unwrap();
        fs::write(base.join("file1.txt"), "Test file 1").unwrap();
        fs::write(base.join("file2.txt"), "Test file 2").unwrap();

        let engine = CommandEngine::new(PathResolver::new(base));
        let session = Session::new("user", "sandbox");
        Self {
            root,
            engine,
            session,
        }
    }

    pub fn path(&self, relative: &str) -> std::path::PathBuf {
        self.root.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
}

pub fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// A writer whose bytes stay readable after the owner is gone.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that remembers what it saw and how often it was closed.
#[derive(Default)]
pub struct RecordingSink {
    pub records: Vec<LogRecord>,
    pub closes: usize,
}

impl LogSink for RecordingSink {
    fn record(&mut self, record: &LogRecord) -> Result<(), AuditError> {
        if self.closes > 0 {
            return Err(AuditError::Closed);
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), AuditError> {
        if self.closes > 0 {
            return Err(AuditError::Closed);
        }
        self.closes += 1;
        Ok(())
    }
}
