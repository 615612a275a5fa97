//! # Command Engine
//!
//! Implements the semantics of every shell command against an explicit
//! [`Session`]. The engine itself only holds the [`PathResolver`] for the fixed
//! sandbox root, so the same engine can drive any number of sessions in tests.
//!
//! Handlers never print. They return an [`Outcome`] or a [`ShellError`] and
//! leave rendering to the session host.

use crate::command::Command;
use crate::copy::{CopyError, Copier};
use crate::error::ShellError;
use crate::format;
use crate::path_resolver::PathResolver;
use crate::session::Session;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

pub const FAREWELL: &str = "Exiting sandsh.";

/// Successful result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Text to show the user; may be empty.
    Output(String),
    /// The session must end after showing the farewell text.
    Exit(String),
}

impl Outcome {
    fn silent() -> Self {
        Outcome::Output(String::new())
    }
}

/// Flags accepted by `ls`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LsOptions {
    pub all: bool,
    pub long: bool,
    pub human: bool,
}

impl LsOptions {
    /// Splits `ls` arguments into options and at most one path operand.
    /// Flags may be combined (`-la`).
    pub fn parse(args: &[String]) -> Result<(Self, Option<&str>), ShellError> {
        let mut options = LsOptions::default();
        let mut path = None;

        for arg in args {
            match arg.strip_prefix('-') {
                Some(flags) if !flags.is_empty() => {
                    for flag in flags.chars() {
                        match flag {
                            'a' => options.all = true,
                            'l' => options.long = true,
                            'h' => options.human = true,
                            other => {
                                return Err(ShellError::invalid(
                                    "ls",
                                    format!("invalid option -- '{other}'"),
                                ));
                            }
                        }
                    }
                }
                _ => {
                    if path.replace(arg.as_str()).is_some() {
                        return Err(ShellError::usage("ls", "ls [-a] [-l] [-h] [path]"));
                    }
                }
            }
        }

        Ok((options, path))
    }
}

/// Parses a `chmod` mode: exactly three octal digits such as `755`.
pub fn parse_mode(mode: &str) -> Option<u32> {
    if mode.len() == 3 && mode.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        u32::from_str_radix(mode, 8).ok()
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct CommandEngine {
    resolver: PathResolver,
}

impl CommandEngine {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Runs one parsed command against `session`.
    pub fn execute(&self, session: &mut Session, command: &Command) -> Result<Outcome, ShellError> {
        debug!(command = command.name(), cwd = %session.current_directory(), "executing");
        match command {
            Command::Whoami(args) => self.whoami(session, args).map(Outcome::Output),
            Command::Ls(args) => self.ls(session, args).map(Outcome::Output),
            Command::Cd(args) => self.cd(session, args).map(|()| Outcome::silent()),
            Command::Chmod(args) => self.chmod(session, args).map(Outcome::Output),
            Command::Cp(args) => self.cp(session, args).map(Outcome::Output),
            Command::Exit => Ok(Outcome::Exit(FAREWELL.to_string())),
            Command::Unknown(raw) => Err(ShellError::UnknownCommand(raw.clone())),
        }
    }

    pub fn whoami(&self, session: &Session, args: &[String]) -> Result<String, ShellError> {
        if !args.is_empty() {
            return Err(ShellError::usage("whoami", "whoami"));
        }
        Ok(session.identity().to_string())
    }

    pub fn ls(&self, session: &Session, args: &[String]) -> Result<String, ShellError> {
        let (options, operand) = LsOptions::parse(args)?;
        let target = session.current_directory().join(operand.unwrap_or(""));
        let shown = operand.map_or_else(|| target.to_string(), str::to_string);
        let real = self.resolver.to_real(&target);

        let metadata = fs::metadata(&real).map_err(|e| classify("ls", &shown, e))?;
        if !metadata.is_dir() {
            return Ok(render_entry(&shown, &metadata, options));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&real).map_err(|e| ShellError::io("ls", &shown, e))? {
            let entry = entry.map_err(|e| ShellError::io("ls", &shown, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if options.all || !name.starts_with('.') {
                entries.push((name, entry.path()));
            }
        }
        entries.sort();

        let mut lines = Vec::with_capacity(entries.len());
        for (name, path) in entries {
            if options.long {
                let metadata = fs::metadata(&path)
                    .or_else(|_| fs::symlink_metadata(&path))
                    .map_err(|e| ShellError::io("ls", &name, e))?;
                lines.push(format::long_entry(&name, &metadata, options.human));
            } else {
                lines.push(name);
            }
        }
        Ok(lines.join("\n"))
    }

    pub fn cd(&self, session: &mut Session, args: &[String]) -> Result<(), ShellError> {
        let target = match args {
            [] => return Ok(()),
            [target] => target,
            _ => return Err(ShellError::usage("cd", "cd [path]")),
        };

        let next = self
            .resolver
            .virtual_path(session.current_directory(), target);
        if self.resolver.to_real(&next).is_dir() {
            debug!(from = %session.current_directory(), to = %next, "changed directory");
            session.set_current_directory(next);
            Ok(())
        } else {
            Err(ShellError::not_found("cd", target.as_str()))
        }
    }

    pub fn chmod(&self, session: &Session, args: &[String]) -> Result<String, ShellError> {
        let [mode, file] = args else {
            return Err(ShellError::usage("chmod", "chmod <mode> <file>"));
        };
        let bits = parse_mode(mode).ok_or_else(|| {
            ShellError::invalid(
                "chmod",
                format!("invalid mode '{mode}': expected three octal digits, e.g. 755"),
            )
        })?;

        let real = self.resolver.resolve(session.current_directory(), file);
        let metadata = fs::metadata(&real).map_err(|e| classify("chmod", file, e))?;
        apply_mode(&real, metadata, bits).map_err(|e| ShellError::io("chmod", file.as_str(), e))?;

        info!(file = %file, mode = %mode, "changed mode");
        Ok(format!("mode of '{file}' changed to {mode}"))
    }

    pub fn cp(&self, session: &Session, args: &[String]) -> Result<String, ShellError> {
        let [source, destination] = args else {
            return Err(ShellError::usage("cp", "cp <source> <destination>"));
        };

        let cwd = session.current_directory();
        let source_path = self.resolver.resolve(cwd, source);
        let destination_path = self.resolver.resolve(cwd, destination);
        if !source_path.exists() {
            return Err(ShellError::not_found("cp", source.as_str()));
        }

        let mut copier =
            Copier::new(self.resolver.root()).map_err(|e| ShellError::io("cp", "/", e))?;
        copier
            .copy(&source_path, &destination_path)
            .map_err(copy_failure)?;

        info!(source = %source, destination = %destination, "copied");
        Ok(format!("'{source}' copied to '{destination}'"))
    }
}

fn render_entry(name: &str, metadata: &fs::Metadata, options: LsOptions) -> String {
    if options.long {
        format::long_entry(name, metadata, options.human)
    } else {
        name.to_string()
    }
}

/// Missing paths become `PathNotFound`, everything else stays an I/O failure.
fn classify(command: &'static str, operand: &str, error: io::Error) -> ShellError {
    if error.kind() == io::ErrorKind::NotFound {
        ShellError::not_found(command, operand)
    } else {
        ShellError::io(command, operand, error)
    }
}

fn copy_failure(error: CopyError) -> ShellError {
    match error {
        CopyError::DestinationConflict(path) => ShellError::DestinationConflict {
            command: "cp",
            path,
        },
        CopyError::Io { path, source } => ShellError::io("cp", path, source),
        other => ShellError::invalid("cp", other.to_string()),
    }
}

#[cfg(unix)]
fn apply_mode(path: &Path, _metadata: fs::Metadata, bits: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(bits))
}

/// Only the owner write bit has a portable counterpart.
#[cfg(not(unix))]
fn apply_mode(path: &Path, metadata: fs::Metadata, bits: u32) -> io::Result<()> {
    let mut permissions = metadata.permissions();
    permissions.set_readonly(bits & 0o200 == 0);
    fs::set_permissions(path, permissions)
}
