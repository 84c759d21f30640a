//! Line input for the shell.
//!
//! The shell asks for field values through `Prompter` so tests can feed
//! scripted answers instead of a terminal.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

pub trait Prompter {
    /// Read one line of input, without the trailing newline.
    /// Returns `None` at end of input.
    fn read_line(&mut self, label: &str) -> Result<Option<String>>;

    /// Read a secret without echoing it
    fn read_password(&mut self, label: &str) -> Result<String>;
}

/// Reads from the terminal
pub struct TerminalPrompter {
    stdin: io::Stdin,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self { stdin: io::stdin() }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, label: &str) -> Result<Option<String>> {
        print!("{}", label);
        io::stdout().flush()?;

        let mut line = String::new();
        let read = self
            .stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn read_password(&mut self, label: &str) -> Result<String> {
        rpassword::prompt_password(label).context("Failed to read password")
    }
}

/// Pre-filled value shown in brackets; an empty answer keeps it
pub fn with_default(answer: String, default: &str) -> String {
    if answer.is_empty() {
        default.to_string()
    } else {
        answer
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_default() {
        assert_eq!(with_default(String::new(), "keep"), "keep");
        assert_eq!(with_default("new".to_string(), "keep"), "new");
    }
}
