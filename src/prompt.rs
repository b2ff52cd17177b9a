//! Blocking operator interaction.
//!
//! Prompts wait on the operator with no timeout. Closed input (EOF) means
//! nobody is left to answer and is reported as a fatal `StepError`.

use crate::error::StepError;
use std::io::{self, BufRead, Cursor, Write};

pub trait OperatorPrompt {
    /// Show `message` and block until the operator presses Enter.
    fn pause(&mut self, message: &str) -> Result<(), StepError>;

    /// Ask a Y/N question, repeating it until the answer is one of the two.
    fn confirm(&mut self, message: &str) -> Result<bool, StepError>;
}

/// `y`/`Y` is yes, `n`/`N` is no, anything else is not an answer.
pub fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim() {
        "y" | "Y" => Some(true),
        "n" | "N" => Some(false),
        _ => None,
    }
}

/// Where operator answers are read from, one line per call.
pub trait LineSource {
    /// Append the next line to `buf`; `Ok(0)` means end of input.
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize>;
}

/// The process' standard input, locked only while a line is read.
///
/// Child processes inherit the same descriptor, so nothing is held between
/// prompts.
pub struct TerminalInput;

impl LineSource for TerminalInput {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        io::stdin().lock().read_line(buf)
    }
}

impl<T: AsRef<[u8]>> LineSource for Cursor<T> {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        BufRead::read_line(self, buf)
    }
}

/// Prompt over a line source and a writer (the terminal in production).
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<TerminalInput, io::Stdout> {
    pub fn stdio() -> Self {
        ConsolePrompt::new(TerminalInput, io::stdout())
    }
}

impl<R: LineSource, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        ConsolePrompt { input, output }
    }

    fn ask(&mut self, message: &str) -> Result<String, StepError> {
        write!(self.output, "{} ", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(StepError::OperatorInputClosed(message.to_string()));
        }
        Ok(line)
    }
}

impl<R: LineSource, W: Write> OperatorPrompt for ConsolePrompt<R, W> {
    fn pause(&mut self, message: &str) -> Result<(), StepError> {
        self.ask(message).map(|_| ())
    }

    fn confirm(&mut self, message: &str) -> Result<bool, StepError> {
        loop {
            let answer = self.ask(message)?;
            if let Some(yes) = parse_answer(&answer) {
                return Ok(yes);
            }
            writeln!(self.output, "Please answer Y or N.")?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("Y\n"), Some(true));
        assert_eq!(parse_answer(" n "), Some(false));
        assert_eq!(parse_answer("yes"), None);
        assert_eq!(parse_answer(""), None);
    }

    #[test]
    fn test_confirm_reasks_until_valid() {
        let mut written = Vec::new();
        let mut prompt = ConsolePrompt::new(Cursor::new("maybe\n\nN\n"), &mut written);
        assert!(!prompt.confirm("Continue? (Y/N)").unwrap());
        drop(prompt);

        let output = String::from_utf8(written).unwrap();
        assert_eq!(output.matches("Continue? (Y/N)").count(), 3);
        assert_eq!(output.matches("Please answer Y or N.").count(), 2);
    }

    #[test]
    fn test_pause_accepts_any_line() {
        let mut prompt = ConsolePrompt::new(Cursor::new("\n"), Vec::new());
        prompt.pause("Press Enter to continue to build").unwrap();
    }

    #[test]
    fn test_stdio_prompt_does_not_hold_stdin() {
        let _prompt = ConsolePrompt::stdio();

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let _lock = io::stdin().lock();
            let _ = tx.send(());
        });
        assert!(rx.recv_timeout(std::time::Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_closed_input_is_fatal() {
        let mut prompt = ConsolePrompt::new(Cursor::new(""), Vec::new());
        let err = prompt.confirm("Continue? (Y/N)").unwrap_err();
        assert!(matches!(err, StepError::OperatorInputClosed(_)));
    }
}
