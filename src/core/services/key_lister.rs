use serde::Serialize;
use tracing::debug;

use crate::core::errors::Result;
use crate::core::models::key::KeyRef;
use crate::core::services::crypto_context::CryptoContext;
use crate::core::services::key_validator::KeyValidator;

/// Keys returned by a listing, in the order the engine reported them.
#[derive(Debug, Default, Serialize)]
pub struct KeyListing {
    pub keys: Vec<KeyRef>,
    /// Keys left out because they are not usable.
    pub bad: usize,
}

/// Runs key listings against a context.
pub struct KeyLister;

impl KeyLister {
    /// List keys matching `pattern` from the local key ring or the key server.
    ///
    /// Unless `include_unusable` is set, keys rejected by
    /// [`KeyValidator::is_usable`] are dropped and only counted. The keylist
    /// mode of `ctx` is restored before returning, on success and on error.
    pub fn list_keys(
        ctx: &mut CryptoContext,
        pattern: &str,
        want_secret: bool,
        remote: bool,
        include_unusable: bool,
    ) -> Result<KeyListing> {
        let now = chrono::Utc::now().timestamp();
        Self::list_keys_at(ctx, pattern, want_secret, remote, include_unusable, now)
    }

    /// Same as [`Self::list_keys`], checking expiry against `now`.
    pub fn list_keys_at(
        ctx: &mut CryptoContext,
        pattern: &str,
        want_secret: bool,
        remote: bool,
        include_unusable: bool,
        now: i64,
    ) -> Result<KeyListing> {
        let mut engine = ctx.scoped_source(remote)?;
        engine
            .keylist_start(pattern, want_secret)
            .map_err(|e| e.with_context(listing_context(pattern)))?;

        let mut listing = KeyListing::default();
        let outcome = loop {
            match engine.keylist_next() {
                Ok(Some(key)) => {
                    let usable = KeyValidator::is_usable(&key, want_secret, remote, now);
                    if include_unusable || usable {
                        listing.keys.push(key);
                    } else {
                        listing.bad += 1;
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e.with_context(listing_context(pattern))),
            }
        };
        engine.keylist_end();
        outcome?;

        debug!(
            pattern,
            remote,
            secret = want_secret,
            found = listing.keys.len(),
            bad = listing.bad,
            "listed keys"
        );
        Ok(listing)
    }
}

pub(crate) fn listing_context(pattern: &str) -> String {
    format!("Could not list keys for “{pattern}”")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::KeysmithError;
    use crate::core::models::keylist_mode::KeylistMode;
    use crate::core::testing::{MockEngine, revoked_key, usable_key};

    #[test]
    fn preserves_enumeration_order() {
        let keys = [usable_key("AAAA"), usable_key("BBBB"), usable_key("CCCC")];
        let mut ctx = MockEngine::new().with_local(&keys).into_context();

        let listing = KeyLister::list_keys(&mut ctx, "", false, false, false).unwrap();
        let fprs: Vec<_> = listing.keys.iter().map(|k| k.fingerprint.as_str()).collect();
        assert_eq!(fprs, ["AAAA", "BBBB", "CCCC"]);
        assert_eq!(listing.bad, 0);
    }

    #[test]
    fn counts_and_drops_unusable_keys() {
        let bad = revoked_key("DEAD");
        let mut ctx = MockEngine::new()
            .with_local(&[usable_key("AAAA"), bad.clone()])
            .into_context();

        let listing = KeyLister::list_keys(&mut ctx, "", false, false, false).unwrap();
        assert_eq!(listing.keys.len(), 1);
        assert_eq!(listing.bad, 1);
        // only the test and the mock's template hold the rejected key
        assert_eq!(std::sync::Arc::strong_count(&bad), 2);
    }

    #[test]
    fn include_unusable_keeps_everything() {
        let keys = [usable_key("AAAA"), revoked_key("DEAD")];
        let mut ctx = MockEngine::new().with_local(&keys).into_context();

        let listing = KeyLister::list_keys(&mut ctx, "", false, false, true).unwrap();
        assert_eq!(listing.keys.len(), 2);
        assert_eq!(listing.bad, 0);
    }

    #[test]
    fn remote_listing_uses_extern_mode() {
        let engine = MockEngine::new().with_remote(&[usable_key("FFFF")]);
        let log = engine.log();
        let mut ctx = engine.into_context();

        let listing = KeyLister::list_keys(&mut ctx, "FFFF", false, true, false).unwrap();
        assert_eq!(listing.keys.len(), 1);
        let (pattern, mode, secret) = log.lock().unwrap().listings[0].clone();
        assert_eq!(pattern, "FFFF");
        assert_eq!(mode, KeylistMode::EXTERN);
        assert!(!secret);
    }

    #[test]
    fn restores_mode_after_success_for_both_sources() {
        for remote in [false, true] {
            for start in [KeylistMode::LOCAL, KeylistMode::EXTERN, KeylistMode::all()] {
                let mut ctx = MockEngine::new().with_mode(start).into_context();
                KeyLister::list_keys(&mut ctx, "", false, remote, false).unwrap();
                assert_eq!(ctx.keylist_mode(), start);
            }
        }
    }

    #[test]
    fn restores_mode_after_failed_start() {
        for remote in [false, true] {
            let mut ctx = MockEngine::new().failing_start().into_context();
            let err = KeyLister::list_keys(&mut ctx, "x", false, remote, false).unwrap_err();
            assert!(matches!(err, KeysmithError::Engine { .. }));
            assert_eq!(ctx.keylist_mode(), KeylistMode::LOCAL);
        }
    }

    #[test]
    fn restores_mode_after_failure_mid_listing() {
        for remote in [false, true] {
            let keys = [usable_key("AAAA"), usable_key("BBBB")];
            let mut ctx = MockEngine::new()
                .with_local(&keys)
                .with_remote(&keys)
                .failing_after(1)
                .into_context();
            let err = KeyLister::list_keys(&mut ctx, "", false, remote, false).unwrap_err();
            assert!(err.to_string().contains("Could not list keys"));
            assert_eq!(ctx.keylist_mode(), KeylistMode::LOCAL);
        }
    }

    #[test]
    fn mode_switch_failure_is_reported() {
        let mut ctx = MockEngine::new().failing_mode_switch().into_context();
        let err = KeyLister::list_keys(&mut ctx, "", false, true, false).unwrap_err();
        assert!(matches!(err, KeysmithError::ModeSwitch { .. }));
    }

    #[test]
    fn expiry_is_checked_against_given_clock() {
        let mut key = (*usable_key("AAAA")).clone();
        for sub in &mut key.subkeys {
            sub.expires = 1_000;
        }
        let key = std::sync::Arc::new(key);
        let mut ctx = MockEngine::new().with_local(&[key]).into_context();

        let before = KeyLister::list_keys_at(&mut ctx, "", false, false, false, 999).unwrap();
        assert_eq!(before.keys.len(), 1);
        let after = KeyLister::list_keys_at(&mut ctx, "", false, false, false, 1_000).unwrap();
        assert_eq!(after.bad, 1);
    }
}
