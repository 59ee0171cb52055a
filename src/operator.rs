// Synchronous operator prompts (batch repair, confirmations, overrides)
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("operator I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("operator input closed")]
    Closed,
}

/// Request/response channel to the human running the pipeline.
/// Calls block until an answer arrives.
pub trait Operator {
    fn ask(&mut self, prompt: &str) -> Result<String, OperatorError>;

    /// Anything but `y`/`Y` counts as "no".
    fn confirm(&mut self, prompt: &str) -> Result<bool, OperatorError> {
        let answer = self.ask(&format!("{} Enter Y or N: ", prompt))?;
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }
}

/// `N` (any case) ends a free-text prompt loop.
pub fn is_stop(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("n")
}

pub struct StdinOperator;

impl Operator for StdinOperator {
    fn ask(&mut self, prompt: &str) -> Result<String, OperatorError> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(OperatorError::Closed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Replays canned answers; records every prompt it was shown.
#[cfg(test)]
pub struct ScriptedOperator {
    answers: std::collections::VecDeque<String>,
    pub prompts: Vec<String>,
}

#[cfg(test)]
impl ScriptedOperator {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

#[cfg(test)]
impl Operator for ScriptedOperator {
    fn ask(&mut self, prompt: &str) -> Result<String, OperatorError> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().ok_or(OperatorError::Closed)
    }
}
