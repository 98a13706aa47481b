use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::core::errors::{KeysmithError, Result};
use crate::core::models::key::KeyRef;
use crate::core::models::keylist_mode::Protocol;
use crate::core::models::presentation::Presentation;
use crate::core::services::crypto_context::CryptoContext;
use crate::core::services::key_importer::KeyImporter;
use crate::core::services::key_lister::KeyLister;
use crate::core::traits::engine::ContextProvider;
use crate::core::traits::presenter::PresentationTarget;

/// Key servers can only be searched by 64 bit key id.
pub const KEYSERVER_ID_LEN: usize = 16;

/// How a key server search ended.
#[derive(Debug)]
pub enum KeyServerOutcome {
    /// The search ran; the payload says what was found or imported.
    Completed(Presentation),
    /// The key server could not be searched.
    Failed(KeysmithError),
}

impl KeyServerOutcome {
    pub fn into_presentation(self) -> Presentation {
        match self {
            KeyServerOutcome::Completed(payload) => payload,
            KeyServerOutcome::Failed(e) => {
                Presentation::Error(format!("Searching the key server failed: {e}"))
            }
        }
    }
}

/// Key server lookups by fingerprint, run off the UI thread.
pub struct KeyServerOperation;

impl KeyServerOperation {
    /// Cut a fingerprint down to the trailing 16 characters a key server accepts.
    pub fn normalize_fingerprint(fingerprint: &str) -> String {
        let len = fingerprint.chars().count();
        fingerprint
            .chars()
            .skip(len.saturating_sub(KEYSERVER_ID_LEN))
            .collect()
    }

    /// Search the key server for `fingerprint` and import the key if exactly
    /// one matches.
    pub fn search_and_import(ctx: &mut CryptoContext, fingerprint: &str) -> KeyServerOutcome {
        let listing = match KeyLister::list_keys(ctx, fingerprint, false, true, false) {
            Ok(listing) => listing,
            Err(e) => return KeyServerOutcome::Failed(e),
        };

        let payload = match listing.keys.as_slice() {
            [] => Presentation::Info(format!(
                "Cannot find a key with fingerprint {fingerprint} on the key server."
            )),
            [key] => import_found(ctx, key),
            keys => Presentation::Warning(format!(
                "Found {} keys with fingerprint {fingerprint} on the key server. \
                 Please check and import the proper key manually.",
                keys.len()
            )),
        };
        KeyServerOutcome::Completed(payload)
    }

    /// Search the key server for `fingerprint` on a background thread.
    ///
    /// Returns as soon as the thread runs. The result is posted to `target`
    /// exactly once; the returned handle may be dropped. Fails without spawning
    /// anything if no engine session can be opened.
    pub fn launch(
        provider: &dyn ContextProvider,
        fingerprint: &str,
        target: Arc<dyn PresentationTarget>,
    ) -> Result<JoinHandle<()>> {
        let ctx = CryptoContext::new(provider, Protocol::OpenPgp)?;
        let task = KeyServerTask {
            ctx,
            fingerprint: Self::normalize_fingerprint(fingerprint),
            target,
        };
        let handle = thread::Builder::new()
            .name("keyserver".into())
            .spawn(move || task.run())?;
        Ok(handle)
    }
}

fn import_found(ctx: &mut CryptoContext, key: &KeyRef) -> Presentation {
    match KeyImporter::import_key(ctx, key) {
        Err(e) => Presentation::Error(e.to_string()),
        Ok((info, None)) => Presentation::Info(info.summary),
        Ok((info, Some(updated))) => Presentation::KeyDetail {
            key: updated,
            summary: info.summary,
        },
    }
}

/// State handed to the worker thread, which owns it exclusively.
struct KeyServerTask {
    ctx: CryptoContext,
    fingerprint: String,
    target: Arc<dyn PresentationTarget>,
}

impl KeyServerTask {
    fn run(self) {
        let KeyServerTask {
            mut ctx,
            fingerprint,
            target,
        } = self;
        debug!(fingerprint = %fingerprint, "searching key server");

        let outcome = KeyServerOperation::search_and_import(&mut ctx, &fingerprint);
        match &outcome {
            KeyServerOutcome::Completed(payload) => {
                info!(
                    fingerprint = %fingerprint,
                    result = payload.message(),
                    "key server search done"
                )
            }
            KeyServerOutcome::Failed(e) => {
                warn!(fingerprint = %fingerprint, error = %e, "key server search failed")
            }
        }

        drop(ctx);
        drop(fingerprint);
        target.post(outcome.into_presentation());
    }
}
