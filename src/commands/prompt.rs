//! Line-oriented terminal prompts

use std::io::{self, BufRead, Write};

/// Print `label`, read one line and return it trimmed. `None` on EOF.
pub fn ask_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> io::Result<Option<String>> {
    write!(output, "{}", label)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Prompt on stdin/stdout.
pub fn ask(label: &str) -> io::Result<Option<String>> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    ask_with(&mut stdin.lock(), &mut stdout, label)
}

/// Use `value` when given on the command line, otherwise ask for it.
/// EOF yields an empty string.
pub fn value_or_ask(value: Option<String>, label: &str) -> io::Result<String> {
    match value {
        Some(v) => Ok(v.trim().to_string()),
        None => Ok(ask(label)?.unwrap_or_default()),
    }
}

/// Yes/no question, anything but `y`/`yes` means no.
pub fn confirm_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> io::Result<bool> {
    let answer = ask_with(input, output, label)?.unwrap_or_default();
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

pub fn confirm(label: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    confirm_with(&mut stdin.lock(), &mut stdout, label)
}
