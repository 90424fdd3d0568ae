//! Yes/no confirmation before destructive work.

use std::io::{self, BufRead, Write};

/// Question asked before removing anything.
pub const REMOVE_PROMPT: &str = "Would you like to remove the duplicates? (y/n): ";

/// Print `question` and read one line of answer.
///
/// Only `y` or `yes` (any case, surrounding whitespace ignored) confirms.
/// End of input counts as no.
///
/// # Errors
///
/// Returns any error from reading or writing.
pub fn confirm<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    write!(output, "{question}")?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }

    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
