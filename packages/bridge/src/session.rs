//! Interactive sessions that run statements in the background.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{self, Sender};

use crate::handle::RuntimeHandle;
use crate::script::Evaluator;

/// Receives what a session prints.
pub trait OutputListener: Send + Sync {
    /// A result or system message.
    fn on_output(&self, text: &str);

    /// An error, formatted `Kind: message`.
    fn on_error(&self, text: &str);
}

/// A terminal session.
pub trait Session {
    /// Start the session. Output goes to `listener`.
    fn start(&mut self, listener: Arc<dyn OutputListener>) -> std::io::Result<()>;

    /// Queue a command. Returns `false` when the session is not running.
    fn execute_command(&self, command: &str) -> bool;

    /// Stop the session. Queued commands that have not started are dropped.
    fn terminate(&mut self);

    fn is_alive(&self) -> bool;
}

/// Message sent when a session starts.
pub const STARTED: &str = "Notify: session started";

/// Message sent when a session ends.
pub const ENDED: &str = "Notify: session ended";

/// Runs statements in order on one worker thread, with one namespace for
/// the whole session.
pub struct ScriptSession {
    handle: Arc<RuntimeHandle>,
    alive: Arc<AtomicBool>,
    sender: Option<Sender<String>>,
    worker: Option<JoinHandle<()>>,
}

impl ScriptSession {
    pub fn new(handle: Arc<RuntimeHandle>) -> Self {
        Self {
            handle,
            alive: Arc::new(AtomicBool::new(false)),
            sender: None,
            worker: None,
        }
    }
}

impl Session for ScriptSession {
    fn start(&mut self, listener: Arc<dyn OutputListener>) -> std::io::Result<()> {
        if self.is_alive() {
            return Ok(());
        }

        let (sender, receiver) = channel::unbounded::<String>();
        let handle = self.handle.clone();
        let alive = self.alive.clone();
        alive.store(true, Ordering::SeqCst);

        let worker = std::thread::Builder::new()
            .name("embedlink-session".to_string())
            .spawn(move || {
                listener.on_output(STARTED);
                if let Err(e) = handle.ensure_ready() {
                    listener.on_error(&e.to_string());
                }

                let mut evaluator = Evaluator::new(handle);
                for command in receiver {
                    if !alive.load(Ordering::SeqCst) {
                        break;
                    }
                    tracing::debug!(command = %command, "session command");
                    match evaluator.execute(&command) {
                        Ok(Some(value)) => listener.on_output(&value.to_string()),
                        Ok(None) => {}
                        Err(e) => listener.on_error(&e.to_string()),
                    }
                }

                listener.on_output(ENDED);
            });

        match worker {
            Ok(worker) => {
                self.sender = Some(sender);
                self.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                self.alive.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn execute_command(&self, command: &str) -> bool {
        if !self.is_alive() {
            return false;
        }
        match &self.sender {
            Some(sender) => sender.send(command.to_string()).is_ok(),
            None => false,
        }
    }

    fn terminate(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        self.sender = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("session worker panicked");
            }
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

impl Drop for ScriptSession {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl OutputListener for Recorder {
        fn on_output(&self, text: &str) {
            self.lines.lock().push(text.to_string());
        }

        fn on_error(&self, text: &str) {
            self.lines.lock().push(format!("error: {}", text));
        }
    }

    fn session() -> ScriptSession {
        ScriptSession::new(Arc::new(RuntimeHandle::new(
            BridgeConfig::default().with_env(false),
        )))
    }

    #[test]
    fn commands_before_start_are_refused() {
        let session = session();
        assert!(!session.is_alive());
        assert!(!session.execute_command("1"));
    }

    #[test]
    fn runs_commands_in_order() {
        let recorder = Arc::new(Recorder::default());
        let mut session = session();
        session.start(recorder.clone()).unwrap();
        assert!(session.is_alive());

        assert!(session.execute_command("x = math_ops.add(1, 2)"));
        assert!(session.execute_command("math_ops.mul(x, x)"));
        assert!(session.execute_command("math_ops.sqrt(-1)"));

        // Wait for the queue to drain before stopping.
        while recorder.lines.lock().len() < 3 {
            std::thread::yield_now();
        }
        session.terminate();
        assert!(!session.is_alive());
        assert!(!session.execute_command("1"));

        let lines = recorder.lines.lock().clone();
        assert_eq!(
            lines,
            vec![
                STARTED.to_string(),
                "9".to_string(),
                "error: ValueError: math domain error".to_string(),
                ENDED.to_string(),
            ]
        );
    }
}
