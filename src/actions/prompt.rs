//! Interactive confirmation for the removal queue.
//!
//! The workflow only needs two answers: which policy to apply to the whole
//! queue, and (in confirm mode) yes or no for each file. [`Confirmer`]
//! captures exactly that; [`TerminalConfirmer`] asks on a terminal, or on any
//! reader/writer pair in tests.

use std::io::{self, BufRead, Write};
use std::path::Path;

use super::queue::{PolicyChoice, RemovalQueue};

/// Source of the user's removal decisions.
pub trait Confirmer {
    /// Ask how to handle the whole queue. `Ok(None)` means the answer was
    /// not understood and the question should be asked again.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be written or read.
    fn choose_policy(&mut self, queue: &RemovalQueue) -> io::Result<Option<PolicyChoice>>;

    /// Ask whether one file should be removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be written or read.
    fn confirm_removal(&mut self, path: &Path) -> io::Result<bool>;
}

/// Line-oriented prompts over a reader and writer.
///
/// End of input answers "quit" to the policy question and "no" to each
/// per-file question.
#[derive(Debug)]
pub struct TerminalConfirmer<R, W> {
    input: R,
    output: W,
}

impl TerminalConfirmer<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr, read answers from stdin.
    ///
    /// Stdout carries only the report, so `--output json` stays parseable
    /// while the user is being asked.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalConfirmer<R, W> {
    /// Prompt on `output`, read answers from `input`.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the writer, e.g. to inspect what was printed.
    pub fn into_output(self) -> W {
        self.output
    }

    fn read_answer(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Confirmer for TerminalConfirmer<R, W> {
    fn choose_policy(&mut self, queue: &RemovalQueue) -> io::Result<Option<PolicyChoice>> {
        writeln!(self.output, "{} duplicate files found.", queue.len())?;
        write!(
            self.output,
            "Shall I \n\tA) Remove them all?\n\tB) Ask again for each file?\n\tC) Quit without deleting anything?\n"
        )?;
        self.output.flush()?;

        let Some(answer) = self.read_answer()? else {
            return Ok(Some(PolicyChoice::Quit));
        };
        let choice = PolicyChoice::parse(&answer);
        match choice {
            Some(PolicyChoice::AskEach) => writeln!(
                self.output,
                "You can try the --rmlog flag to save out a removal script next time."
            )?,
            Some(PolicyChoice::Quit) => writeln!(
                self.output,
                "You can use the search command rather than remove or try the --rmlog flag to save out a removal script next time."
            )?,
            Some(PolicyChoice::RemoveAll) => {}
            None => writeln!(self.output, "I did not understand your answer.")?,
        }
        Ok(choice)
    }

    fn confirm_removal(&mut self, path: &Path) -> io::Result<bool> {
        write!(self.output, "Remove {}? ", path.display())?;
        self.output.flush()?;
        Ok(self
            .read_answer()?
            .is_some_and(|answer| answer.eq_ignore_ascii_case("y")))
    }
}
