//! The boundary between the REPL loop and whatever drives it.
//!
//! [`ReplCore`](crate::repl::ReplCore) only talks to an [`IoHost`]. The
//! terminal host uses reedline; tests use [`TestHost`].

use std::collections::VecDeque;

/// Error type for I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(String),
}

/// A line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLine {
    pub line: String,
}

/// Ctrl+C or Ctrl+D.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Eof,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputStyle {
    /// A result, printed as is.
    #[default]
    Normal,
    /// An error, already formatted `Kind: message`.
    Error,
    /// Status and system messages.
    Info,
    Banner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub text: String,
    pub style: OutputStyle,
}

impl Output {
    fn styled(text: impl Into<String>, style: OutputStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn normal(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Normal)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Error)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Info)
    }

    pub fn banner(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Banner)
    }
}

/// What the prompt shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptConfig {
    /// Lifecycle state of the runtime (`ready`, `failed`, ...).
    pub runtime_state: String,
    /// Number of variables in the session namespace.
    pub variable_count: usize,
}

/// Why the loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit` or `quit`.
    UserExit,
    /// Ctrl+D.
    Eof,
}

/// Host interface for REPL I/O.
pub trait IoHost {
    /// Block until the user enters a line or sends a signal.
    fn wait_for_input(&mut self) -> Result<(), IoError>;

    /// Take the line entered since the last wait, if any.
    fn read_input(&mut self) -> Result<Option<InputLine>, IoError>;

    /// Take the signal received since the last wait, if any.
    fn read_signal(&mut self) -> Result<Option<Signal>, IoError>;

    fn write_output(&mut self, output: Output) -> Result<(), IoError>;

    /// Set the prompt shown before the next line.
    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError>;

    fn flush(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}

/// In-memory host: queued input, recorded output.
#[derive(Debug, Default)]
pub struct TestHost {
    inputs: VecDeque<String>,
    signals: VecDeque<Signal>,
    outputs: Vec<Output>,
    last_prompt: Option<PromptConfig>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn queue_signal(&mut self, signal: Signal) {
        self.signals.push_back(signal);
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Text of every output with `style`.
    pub fn texts(&self, style: OutputStyle) -> Vec<&str> {
        self.outputs
            .iter()
            .filter(|o| o.style == style)
            .map(|o| o.text.as_str())
            .collect()
    }

    pub fn last_prompt(&self) -> Option<&PromptConfig> {
        self.last_prompt.as_ref()
    }
}

impl IoHost for TestHost {
    fn wait_for_input(&mut self) -> Result<(), IoError> {
        Ok(())
    }

    fn read_input(&mut self) -> Result<Option<InputLine>, IoError> {
        Ok(self.inputs.pop_front().map(|line| InputLine { line }))
    }

    fn read_signal(&mut self) -> Result<Option<Signal>, IoError> {
        // Signals only arrive between lines.
        Ok(self.signals.pop_front())
    }

    fn write_output(&mut self, output: Output) -> Result<(), IoError> {
        self.outputs.push(output);
        Ok(())
    }

    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError> {
        self.last_prompt = Some(config);
        Ok(())
    }
}
