//! Console helpers shared by the example programs.

use std::io::{self, BufRead, Write};

use crate::inference::ChatError;

/// Inputs that end an interactive session (compared case-insensitively).
pub const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "q"];

/// What a line typed at the prompt means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Exit,
    Empty,
    Prompt(String),
}

/// Classify one line of user input.
pub fn classify(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Input::Empty
    } else if EXIT_COMMANDS
        .iter()
        .any(|cmd| trimmed.eq_ignore_ascii_case(cmd))
    {
        Input::Exit
    } else {
        Input::Prompt(trimmed.to_string())
    }
}

/// Print `label`, flush, and read one line.
///
/// Returns `None` at end of input.
pub fn read_line<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    label: &str,
) -> io::Result<Option<String>> {
    write!(writer, "{label}")?;
    writer.flush()?;

    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// A title followed by a rule of `=` of the given width.
pub fn banner(title: &str, width: usize) -> String {
    format!("{title}\n{}", "=".repeat(width))
}

/// A rule of `-` of the given width.
pub fn separator(width: usize) -> String {
    "-".repeat(width)
}

/// Render an error for the console, preferring the server's own message.
pub fn describe_error(err: &ChatError) -> String {
    match (err.status(), err.api_message()) {
        (Some(status), Some(message)) => format!("HTTP {status}: {message}"),
        _ => err.to_string(),
    }
}
