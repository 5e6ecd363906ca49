//! Interactive confirmation before anything is created remotely.

use std::io::{self, BufRead, Write};

use crate::error::AppError;

/// Ask `prompt` on stdout and read the answer from stdin.
pub fn confirm(prompt: &str) -> Result<bool, AppError> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    confirm_with(&mut stdin.lock(), &mut stdout, prompt)
}

/// Only `y` / `Y` (surrounding whitespace ignored) counts as yes. End of
/// input is a no.
pub fn confirm_with<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<bool, AppError> {
    write!(output, "{prompt} (y/n) ")
        .and_then(|_| output.flush())
        .map_err(|e| AppError::io(format!("Failed to write prompt: {e}")))?;

    let mut answer = String::new();
    let bytes = input
        .read_line(&mut answer)
        .map_err(|e| AppError::io(format!("Failed to read input: {e}")))?;
    if bytes == 0 {
        return Ok(false);
    }

    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
