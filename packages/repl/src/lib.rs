//! # embedlink-repl
//!
//! An interactive terminal for an embedded runtime.
//!
//! Each line is either a meta command (`help`, `modules`, `vars`, `reset`,
//! `exit`) or a statement that calls into the runtime:
//!
//! ```text
//! embedlink [ready] > math_ops.add(2, 3)
//! 5
//! embedlink [ready] > r = math_ops.sqrt(16)
//! embedlink [ready] 1 var(s) > math_ops.div(r, 0)
//! ZeroDivisionError: division by zero
//! ```
//!
//! The loop in [`repl::ReplCore`] only talks to an [`io::IoHost`], so it runs
//! the same against the reedline terminal and the in-memory test host.

pub mod commands;
pub mod completer;
pub mod highlighter;
pub mod host;
pub mod io;
pub mod logging;
pub mod repl;

use embedlink::{BridgeConfig, RuntimeHandle};

use crate::completer::Candidates;
use crate::host::TerminalHost;
use crate::io::{ExitReason, IoError};
use crate::repl::ReplCore;

/// Install `config` as the global runtime and run the terminal REPL on it.
///
/// The runtime is shut down when the loop ends.
pub fn run(config: BridgeConfig) -> Result<ExitReason, IoError> {
    if !RuntimeHandle::init_global(config) {
        tracing::warn!("global runtime already configured; ignoring new configuration");
    }
    let handle = RuntimeHandle::global();

    let candidates = Candidates::default();
    let mut host = TerminalHost::new(candidates.clone()).map_err(|e| IoError::Io(e.to_string()))?;
    let result = ReplCore::new(handle.clone())
        .with_candidates(candidates)
        .run(&mut host);

    handle.shutdown();
    result
}
