use std::{
    io::{self, BufRead, StdinLock, Stdout, Write},
    path::{Path, PathBuf},
};

use ansi_term::Colour;
use tracing::warn;

use crate::sync::interaction::{FilePrompt, Notifier};

/// Asks for paths on the terminal. End of input dismisses the prompt.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        let asked = write!(self.output, "{question}").and_then(|_| self.output.flush());
        if let Err(e) = asked {
            warn!("Couldn't show prompt {e}");
            return None;
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_owned()),
            Err(e) => {
                warn!("Couldn't read answer {e}");
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> FilePrompt for TerminalPrompt<R, W> {
    fn pick_save_target(&mut self, suggested: &Path) -> Option<PathBuf> {
        let answer = self.ask(&format!(
            "Save time tracker data to [{}]: ",
            suggested.display()
        ))?;
        if answer.is_empty() {
            Some(suggested.to_path_buf())
        } else {
            Some(PathBuf::from(answer))
        }
    }

    fn pick_open_target(&mut self) -> Option<PathBuf> {
        let answer = self.ask("Select time tracker data file (.json): ")?;
        (!answer.is_empty()).then(|| PathBuf::from(answer))
    }
}

/// Prints user facing messages, errors in red on stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn info(&mut self, message: &str) {
        println!("{}", Colour::Green.paint(message));
    }

    fn error(&mut self, message: &str) {
        eprintln!("{}", Colour::Red.paint(message));
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, path::PathBuf};

    use crate::sync::interaction::FilePrompt;

    use super::TerminalPrompt;

    #[test]
    fn test_empty_answer_takes_suggestion() {
        let mut output = Vec::new();
        let mut prompt = TerminalPrompt::new(Cursor::new("\n"), &mut output);

        let target = prompt.pick_save_target(&PathBuf::from("/home/tally/data.json"));

        assert_eq!(target, Some(PathBuf::from("/home/tally/data.json")));
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Save time tracker data to [/home/tally/data.json]: "
        );
    }

    #[test]
    fn test_answer_overrides_suggestion() {
        let mut prompt = TerminalPrompt::new(Cursor::new("  /tmp/other.json \n"), Vec::new());

        let target = prompt.pick_save_target(&PathBuf::from("/home/tally/data.json"));

        assert_eq!(target, Some(PathBuf::from("/tmp/other.json")));
    }

    #[test]
    fn test_end_of_input_cancels() {
        let mut prompt = TerminalPrompt::new(Cursor::new(""), Vec::new());

        assert_eq!(prompt.pick_save_target(&PathBuf::from("/x.json")), None);
        assert_eq!(prompt.pick_open_target(), None);
    }

    #[test]
    fn test_open_requires_a_path() {
        let mut prompt = TerminalPrompt::new(Cursor::new("\n/tmp/in.json\n"), Vec::new());

        assert_eq!(prompt.pick_open_target(), None);
        assert_eq!(prompt.pick_open_target(), Some(PathBuf::from("/tmp/in.json")));
    }
}
