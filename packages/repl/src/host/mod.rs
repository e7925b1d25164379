//! Interactive hosts for the REPL loop.

pub mod terminal;

pub use terminal::{TerminalHost, EDIT_MODE_ENV};
