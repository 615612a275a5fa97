//! # Session Host
//!
//! Drives a session: reads lines, runs them through the [`CommandEngine`],
//! prints output or a one-line diagnostic, and appends a record to the audit
//! log after every command, whether it succeeded or not.
//!
//! Two front ends share [`Shell::handle_line`]:
//!
//! - [`Shell::run_interactive`]: a `rustyline` prompt with in-memory history.
//! - [`Shell::run_script`]: any `BufRead`, used for piped input and tests.
//!
//! `exit`, end of input and Ctrl-C all end the session the same way: the
//! farewell is printed and the audit log is closed exactly once.

use crate::audit::{CsvAuditLog, LogRecord, LogSink};
use crate::command::parse_line;
use crate::config::ShellConfig;
use crate::engine::{CommandEngine, FAREWELL, Outcome};
use crate::path_resolver::PathResolver;
use crate::sandbox::SandboxRoot;
use crate::session::Session;
use anyhow::{Context, Result};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use tracing::{info, warn};

/// Whether the host should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A shell whose audit log is a CSV file on disk.
pub type FileShell = Shell<CsvAuditLog<BufWriter<File>>>;

#[derive(Debug)]
pub struct Shell<S: LogSink> {
    engine: CommandEngine,
    session: Session,
    sink: S,
    finished: bool,
}

impl FileShell {
    /// Materializes the sandbox and opens the audit log described by `config`.
    ///
    /// The returned [`SandboxRoot`] owns the sandbox directory and must outlive
    /// the shell.
    pub fn from_config(config: &ShellConfig) -> Result<(SandboxRoot, Self)> {
        let root = SandboxRoot::from_archive(&config.fs_archive).with_context(|| {
            format!(
                "Failed to materialize sandbox from {}",
                config.fs_archive.display()
            )
        })?;
        let sink = CsvAuditLog::create(&config.log_file).with_context(|| {
            format!("Failed to open audit log {}", config.log_file.display())
        })?;
        let engine = CommandEngine::new(PathResolver::new(root.path()));
        let session = Session::new(&config.username, &config.hostname);
        Ok((root, Shell::new(engine, session, sink)))
    }
}

impl<S: LogSink> Shell<S> {
    pub fn new(engine: CommandEngine, session: Session, sink: S) -> Self {
        Self {
            engine,
            session,
            sink,
            finished: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn engine(&self) -> &CommandEngine {
        &self.engine
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Processes one input line. Blank lines are ignored and not logged.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        if self.finished {
            return Ok(Flow::Exit);
        }
        let Some(parsed) = parse_line(line) else {
            return Ok(Flow::Continue);
        };

        let result = self.engine.execute(&mut self.session, &parsed.command);
        let record = LogRecord::now(self.session.identity(), parsed.raw.as_str());

        let flow = match result {
            Ok(Outcome::Output(text)) => {
                if !text.is_empty() {
                    writeln!(out, "{text}")?;
                }
                Flow::Continue
            }
            Ok(Outcome::Exit(farewell)) => {
                writeln!(out, "{farewell}")?;
                Flow::Exit
            }
            Err(e) => {
                warn!(command = %parsed.raw, error = %e, "command failed");
                writeln!(out, "{e}")?;
                Flow::Continue
            }
        };

        self.sink
            .record(&record)
            .context("Failed to append to audit log")?;

        if flow == Flow::Exit {
            self.finish()?;
        }
        Ok(flow)
    }

    /// Runs commands from `input` until `exit` or end of input.
    pub fn run_script<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("Failed to read input line")?;
            if self.handle_line(&line, out)? == Flow::Exit {
                return Ok(());
            }
        }
        self.end_session(out)
    }

    /// Runs the interactive prompt until `exit`, Ctrl-D or Ctrl-C.
    pub fn run_interactive(&mut self) -> Result<()> {
        let mut rl: Editor<(), DefaultHistory> =
            Editor::new().context("Failed to create editor")?;
        let stdout = std::io::stdout();

        loop {
            match rl.readline(&self.session.prompt()) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        if let Err(e) = rl.add_history_entry(line.as_str()) {
                            warn!("Failed to add history entry: {}", e);
                        }
                    }
                    if self.handle_line(&line, &mut stdout.lock())? == Flow::Exit {
                        return Ok(());
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    return self.end_session(&mut stdout.lock());
                }
                Err(ReadlineError::Eof) => {
                    println!("^D");
                    return self.end_session(&mut stdout.lock());
                }
                Err(err) => {
                    self.end_session(&mut stdout.lock())?;
                    return Err(err).context("Failed to read input");
                }
            }
        }
    }

    /// Ends the session without an explicit `exit` command.
    fn end_session<W: Write>(&mut self, out: &mut W) -> Result<()> {
        if !self.finished {
            writeln!(out, "{FAREWELL}")?;
            self.finish()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        self.sink.close().context("Failed to close audit log")?;
        info!(user = %self.session.identity(), "session ended");
        Ok(())
    }
}
