//! Main-thread callback queue.
//!
//! Worker threads never touch the terminal themselves. They hand closures
//! to a [`LoopHandle`] and the thread that owns the terminal runs them in
//! order from [`EventLoop::run`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use indicatif::ProgressBar;
use tracing::debug;

use crate::cli::output;
use crate::core::models::presentation::Presentation;
use crate::core::traits::presenter::PresentationTarget;

type Callback = Box<dyn FnOnce() + Send>;

pub struct EventLoop {
    tx: Sender<Callback>,
    rx: Receiver<Callback>,
}

impl EventLoop {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn handle(&self) -> LoopHandle {
        LoopHandle(self.tx.clone())
    }

    /// Run queued callbacks until every handle has been dropped.
    pub fn run(self) -> usize {
        let EventLoop { tx, rx } = self;
        drop(tx);
        let mut ran = 0;
        for callback in rx {
            callback();
            ran += 1;
        }
        debug!(callbacks = ran, "event loop drained");
        ran
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Sending side of an [`EventLoop`]; cheap to clone and `Send`.
#[derive(Clone)]
pub struct LoopHandle(Sender<Callback>);

impl LoopHandle {
    /// Queue `f` to run on the loop thread.
    pub fn invoke(&self, f: impl FnOnce() + Send + 'static) {
        // loop already gone: nothing left to run it on
        let _ = self.0.send(Box::new(f));
    }
}

/// Presents payloads on the terminal from the loop thread.
///
/// Errors are not printed; they are kept for the caller so the process
/// can exit with a failure status.
pub struct TerminalPresenter {
    handle: LoopHandle,
    spinner: Option<ProgressBar>,
    failure: Arc<Mutex<Option<String>>>,
}

impl TerminalPresenter {
    pub fn new(handle: LoopHandle) -> Self {
        Self {
            handle,
            spinner: None,
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Clear `spinner` before the payload is shown.
    pub fn with_spinner(mut self, spinner: ProgressBar) -> Self {
        self.spinner = Some(spinner);
        self
    }

    /// Slot that receives the message of an error payload.
    pub fn failure(&self) -> Arc<Mutex<Option<String>>> {
        Arc::clone(&self.failure)
    }
}

impl PresentationTarget for TerminalPresenter {
    fn post(&self, payload: Presentation) {
        let spinner = self.spinner.clone();
        let failure = Arc::clone(&self.failure);
        self.handle.invoke(move || {
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }
            match payload {
                Presentation::Error(message) => {
                    if let Ok(mut slot) = failure.lock() {
                        *slot = Some(message);
                    }
                }
                other => output::present(&other),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn callbacks_run_on_loop_thread_in_order() {
        let event_loop = EventLoop::new();
        let handle = event_loop.handle();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let loop_thread = thread::current().id();

        let worker = {
            let seen = Arc::clone(&seen);
            thread::spawn(move || {
                for i in 0..3 {
                    let seen = Arc::clone(&seen);
                    handle.invoke(move || {
                        assert_eq!(thread::current().id(), loop_thread);
                        seen.lock().unwrap().push(i);
                    });
                }
            })
        };

        assert_eq!(event_loop.run(), 3);
        worker.join().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn loop_without_handles_returns_immediately() {
        assert_eq!(EventLoop::new().run(), 0);
    }

    #[test]
    fn error_payload_is_kept_for_caller() {
        let event_loop = EventLoop::new();
        let presenter = TerminalPresenter::new(event_loop.handle());
        let failure = presenter.failure();

        presenter.post(Presentation::Error("Searching the key server failed: boom".into()));
        drop(presenter);
        event_loop.run();

        assert_eq!(
            failure.lock().unwrap().as_deref(),
            Some("Searching the key server failed: boom")
        );
    }
}
