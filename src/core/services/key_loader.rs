use tracing::debug;

use crate::core::errors::{KeysmithError, Result};
use crate::core::models::key::KeyRef;
use crate::core::services::crypto_context::CryptoContext;
use crate::core::services::key_lister::listing_context;

/// Fetches single keys by fingerprint.
pub struct KeyLoader;

impl KeyLoader {
    /// Load the single key matching `fingerprint` from the local key ring.
    ///
    /// Fails with [`KeysmithError::NotFound`] if nothing matches and with
    /// [`KeysmithError::Ambiguous`] if more than one key does.
    pub fn load_key(ctx: &mut CryptoContext, fingerprint: &str) -> Result<KeyRef> {
        let mut engine = ctx.scoped_source(false)?;

        engine
            .keylist_start(fingerprint, false)
            .map_err(|e| e.with_context(listing_context(fingerprint)))?;

        let first = engine.keylist_next();
        let second = match &first {
            Ok(Some(_)) => engine.keylist_next(),
            _ => Ok(None),
        };
        engine.keylist_end();

        match (first, second) {
            (Err(e), _) | (_, Err(e)) => Err(e.with_context(listing_context(fingerprint))),
            (Ok(None), _) => Err(KeysmithError::NotFound {
                pattern: fingerprint.to_string(),
            }),
            (Ok(Some(_)), Ok(Some(_))) => Err(KeysmithError::Ambiguous {
                pattern: fingerprint.to_string(),
            }),
            (Ok(Some(key)), Ok(None)) => {
                debug!(fingerprint = %key.fingerprint, "loaded key");
                Ok(key)
            }
        }
    }
}
