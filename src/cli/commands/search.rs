use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::cli::context::AppContext;
use crate::cli::event_loop::{EventLoop, TerminalPresenter};
use crate::cli::output;
use crate::core::errors::{KeysmithError, Result};
use crate::core::services::keyserver_service::KeyServerOperation;

/// Execute the `keysmith search` command.
///
/// The lookup runs on a worker thread while this thread drives the event
/// loop that shows its result.
pub fn execute(app: &AppContext, fingerprint: &str) -> Result<()> {
    let event_loop = EventLoop::new();
    let spinner = output::spinner(&format!(
        "Searching the key server for {}...",
        KeyServerOperation::normalize_fingerprint(fingerprint)
    ));
    let presenter = TerminalPresenter::new(event_loop.handle()).with_spinner(spinner.clone());
    let failure = presenter.failure();

    let worker = match KeyServerOperation::launch(
        app.provider.as_ref(),
        fingerprint,
        Arc::new(presenter),
    ) {
        Ok(worker) => worker,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };
    event_loop.run();
    // a worker that died before posting never cleared the spinner
    spinner.finish_and_clear();

    finish(worker, &failure)
}

/// Turn the worker's outcome into the command result.
fn finish(worker: JoinHandle<()>, failure: &Mutex<Option<String>>) -> Result<()> {
    if worker.join().is_err() {
        return Err(KeysmithError::KeyServer {
            message: "Searching the key server failed: the lookup stopped unexpectedly".into(),
        });
    }

    let failure = failure.lock().ok().and_then(|mut slot| slot.take());
    match failure {
        Some(message) => Err(KeysmithError::KeyServer { message }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn finished_worker_without_error_succeeds() {
        let worker = thread::spawn(|| {});
        assert!(finish(worker, &Mutex::new(None)).is_ok());
    }

    #[test]
    fn error_payload_fails_the_command() {
        let worker = thread::spawn(|| {});
        let failure = Mutex::new(Some("Searching the key server failed: boom".to_string()));

        let err = finish(worker, &failure).unwrap_err();
        assert!(matches!(
            err,
            KeysmithError::KeyServer { ref message } if message.ends_with("boom")
        ));
    }

    #[test]
    fn panicked_worker_is_a_key_server_error() {
        let worker = thread::spawn(|| panic!("engine session poisoned"));

        let err = finish(worker, &Mutex::new(None)).unwrap_err();
        assert!(matches!(err, KeysmithError::KeyServer { .. }));
        assert!(err.to_string().contains("stopped unexpectedly"));
    }
}
