//! Yes/no confirmation used when the connectivity check fails.
//!
//! Anything other than an explicit "y"/"yes" counts as no, including an empty
//! line, end of input and read errors.

use std::io::{self, BufRead, Write};

use tracing::warn;

/// Asks the user whether to go on.
pub trait Confirm {
    /// Return `true` to proceed.
    fn confirm(&mut self, question: &str) -> bool;
}

/// Interpret one line of user input.
pub fn parse_answer(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Prompts on a writer and reads the answer from a line reader.
pub struct LineConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineConfirm<R, W> {
    /// Create a prompt over arbitrary streams.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "\n{} (y/N): ", question)?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(parse_answer(&line))
    }
}

impl LineConfirm<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on stdout, read from stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for LineConfirm<R, W> {
    fn confirm(&mut self, question: &str) -> bool {
        match self.ask(question) {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Failed to read confirmation, assuming no: {}", e);
                false
            }
        }
    }
}

/// Never asks; always declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl Confirm for Headless {
    fn confirm(&mut self, _question: &str) -> bool {
        false
    }
}

/// Never asks; always proceeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _question: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(input: &str) -> (bool, String) {
        let mut output = Vec::new();
        let accepted = LineConfirm::new(input.as_bytes(), &mut output).confirm("Continue anyway?");
        (accepted, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_parse_answer() {
        assert!(parse_answer("y"));
        assert!(parse_answer("Y\n"));
        assert!(parse_answer("  yes  "));
        assert!(!parse_answer(""));
        assert!(!parse_answer("\n"));
        assert!(!parse_answer("n"));
        assert!(!parse_answer("no"));
        assert!(!parse_answer("yep"));
    }

    #[test]
    fn test_line_confirm_yes() {
        let (accepted, prompt) = answer("y\n");
        assert!(accepted);
        assert!(prompt.contains("Continue anyway? (y/N): "));
    }

    #[test]
    fn test_line_confirm_defaults_to_no() {
        assert!(!answer("\n").0);
        assert!(!answer("n\n").0);
        // End of input
        assert!(!answer("").0);
    }

    #[test]
    fn test_fixed_answers() {
        assert!(!Headless.confirm("Continue anyway?"));
        assert!(AssumeYes.confirm("Continue anyway?"));
    }
}
