//! Input line tokenization.
//!
//! Lines are split strictly on whitespace; there is no quoting or escaping.
//! The first token is matched exactly against the known command names, so an
//! argument such as `cdrom` is never mistaken for `cd`.

/// A recognized command and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Whoami(Vec<String>),
    Ls(Vec<String>),
    Cd(Vec<String>),
    Chmod(Vec<String>),
    Cp(Vec<String>),
    Exit,
    /// Anything else, carrying the raw (trimmed) input text.
    Unknown(String),
}

impl Command {
    pub fn name(&self) -> &str {
        match self {
            Command::Whoami(_) => "whoami",
            Command::Ls(_) => "ls",
            Command::Cd(_) => "cd",
            Command::Chmod(_) => "chmod",
            Command::Cp(_) => "cp",
            Command::Exit => "exit",
            Command::Unknown(raw) => raw,
        }
    }
}

/// One parsed input line together with the text that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub raw: String,
    pub command: Command,
}

/// Parses a single input line. Returns `None` for blank lines.
pub fn parse_line(line: &str) -> Option<CommandLine> {
    let raw = line.trim();
    let mut tokens = raw.split_whitespace();
    let name = tokens.next()?;
    let args: Vec<String> = tokens.map(str::to_string).collect();

    let command = match name {
        "whoami" => Command::Whoami(args),
        "ls" => Command::Ls(args),
        "cd" => Command::Cd(args),
        "chmod" => Command::Chmod(args),
        "cp" => Command::Cp(args),
        "exit" => Command::Exit,
        _ => Command::Unknown(raw.to_string()),
    };

    Some(CommandLine {
        raw: raw.to_string(),
        command,
    })
}
