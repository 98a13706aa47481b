use std::sync::mpsc::Sender;

use crate::core::models::presentation::Presentation;

/// Port for handing results of background operations to the UI thread.
///
/// `post` is called from worker threads. Implementations must queue the
/// payload for the thread that owns the UI and return without blocking.
pub trait PresentationTarget: Send + Sync {
    fn post(&self, payload: Presentation);
}

/// The receiving end is drained by whoever owns the UI.
impl PresentationTarget for Sender<Presentation> {
    fn post(&self, payload: Presentation) {
        // a closed receiver means nobody is left to show the result
        let _ = self.send(payload);
    }
}
