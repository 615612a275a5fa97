//! # Sandsh Executable
//!
//! Entry point for the `sandsh` shell. It parses the command line, initializes
//! diagnostic logging, loads the shell descriptor, materializes the sandbox and
//! hands control to the session host.
//!
//! ## Execution Flow
//!
//! 1. `Cli::parse()` reads and validates command-line arguments.
//! 2. Logging is initialized (rolling file by default, stderr on request).
//! 3. The descriptor is loaded and command-line overrides are applied.
//! 4. The archive is expanded into a private sandbox root and the audit log is
//!    opened.
//! 5. Commands are read interactively, or from `--script` when given, until
//!    `exit` or end of input.

use anyhow::{Context, Result};
use clap::Parser;
use sandsh_core::{config::ShellConfig, shell::FileShell, utils::logging::init_logging};
use std::{
    fs::File,
    io::{self, BufReader},
    path::PathBuf,
};
use tracing::{info, instrument};

/// Sandsh: a shell confined to a virtual filesystem expanded from an archive.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "sandsh expands a zip archive into a private sandbox directory and runs a
small shell (ls, cd, whoami, chmod, cp, exit) against it. Every command is
appended to a CSV audit log.

Example: sandsh --config config.json
Example: sandsh --config config.toml --script commands.txt"
)]
struct Cli {
    /// Path to the shell descriptor (.json or .toml).
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Override the user name from the descriptor.
    #[arg(long)]
    user: Option<String>,

    /// Override the displayed host name from the descriptor.
    #[arg(long)]
    host: Option<String>,

    /// Override the archive expanded into the sandbox.
    #[arg(long)]
    archive: Option<PathBuf>,

    /// Override the audit log destination.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Read commands from this file instead of the interactive prompt.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,

    /// Log to stderr instead of file.
    #[arg(long)]
    log_to_stderr: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded descriptor.
    fn apply_overrides(&self, mut config: ShellConfig) -> ShellConfig {
        if let Some(user) = &self.user {
            config.username = user.clone();
        }
        if let Some(host) = &self.host {
            config.hostname = host.clone();
        }
        if let Some(archive) = &self.archive {
            config.fs_archive = archive.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = log_file.clone();
        }
        config
    }
}

#[instrument]
fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    init_logging(log_level, !cli.log_to_stderr)?;

    let config = ShellConfig::load_from_file(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;
    let config = cli.apply_overrides(config);
    config.validate()?;
    info!(user = %config.username, host = %config.hostname, "starting session");

    // `_root` owns the sandbox directory and must outlive the shell.
    let (_root, mut shell) = FileShell::from_config(&config)?;

    match &cli.script {
        Some(script) => {
            let file = File::open(script)
                .with_context(|| format!("Failed to open script {}", script.display()))?;
            shell.run_script(BufReader::new(file), &mut io::stdout().lock())
        }
        None => shell.run_interactive(),
    }
}
