//! The REPL loop.
//!
//! [`ReplCore`] reads lines through an [`IoHost`], runs them against an
//! [`Evaluator`], and writes results back. It knows nothing about terminals.

use std::sync::Arc;

use embedlink::{Evaluator, RuntimeHandle, RuntimeState};

use crate::commands::{self, CommandResult};
use crate::completer::Candidates;
use crate::io::{ExitReason, IoError, IoHost, Output, PromptConfig, Signal};

pub struct ReplCore {
    evaluator: Evaluator,
    candidates: Candidates,
}

impl ReplCore {
    pub fn new(handle: Arc<RuntimeHandle>) -> Self {
        Self {
            evaluator: Evaluator::new(handle),
            candidates: Candidates::default(),
        }
    }

    /// Share completion candidates with a line editor.
    pub fn with_candidates(mut self, candidates: Candidates) -> Self {
        self.candidates = candidates;
        self
    }

    /// Run until `exit` or end of input.
    pub fn run(&mut self, io: &mut impl IoHost) -> Result<ExitReason, IoError> {
        io.write_output(Output::banner(BANNER))?;
        if let Err(e) = self.evaluator.handle().ensure_ready() {
            io.write_output(Output::error(e.to_string()))?;
        }
        self.refresh_candidates();

        loop {
            self.update_prompt(io)?;
            io.wait_for_input()?;

            if let Some(signal) = io.read_signal()? {
                match signal {
                    Signal::Eof => {
                        io.write_output(Output::info("Goodbye!"))?;
                        io.flush()?;
                        return Ok(ExitReason::Eof);
                    }
                    Signal::Interrupt => {
                        io.write_output(Output::info("^C (use 'exit' to quit)"))?;
                        continue;
                    }
                }
            }

            let input = match io.read_input()? {
                Some(input) => input,
                None => continue,
            };

            match commands::execute(&input.line, &mut self.evaluator) {
                CommandResult::Ok { display: None } => {}
                CommandResult::Ok {
                    display: Some(text),
                } => io.write_output(Output::normal(text))?,
                CommandResult::Error(msg) => io.write_output(Output::error(msg))?,
                CommandResult::Help => io.write_output(Output::normal(commands::format_help()))?,
                CommandResult::Exit => {
                    io.write_output(Output::info("Goodbye!"))?;
                    io.flush()?;
                    return Ok(ExitReason::UserExit);
                }
            }

            self.refresh_candidates();
            io.flush()?;
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    fn update_prompt(&self, io: &mut impl IoHost) -> Result<(), IoError> {
        io.write_prompt(PromptConfig {
            runtime_state: self.evaluator.handle().state().to_string(),
            variable_count: self.evaluator.variables().len(),
        })
    }

    /// Rebuild completion names. Never starts the runtime.
    fn refresh_candidates(&self) {
        let mut names: Vec<String> = self.evaluator.variables().keys().cloned().collect();
        if self.evaluator.handle().state() == RuntimeState::Ready {
            if let Ok(modules) = commands::module_listing(&self.evaluator) {
                for (module, _, functions) in modules {
                    names.extend(functions.iter().map(|f| format!("{}.{}", module, f)));
                }
            }
        }
        names.sort();
        *self.candidates.write() = names;
    }
}

const BANNER: &str = r#"
              _              _ _ _       _
  ___ _ __ __| |__   ___  __| | (_)_ __ | | __
 / _ \ '_ ` _ \ '_ \ / _ \/ _` | | | '_ \| |/ /
|  __/ | | | | | |_) |  __/ (_| | | | | | |   <
 \___|_| |_| |_|_.__/ \___|\__,_|_|_|_| |_|_|\_\

Type 'help' for statements and commands, 'exit' to quit.
"#;
