use std::ops::{Deref, DerefMut};

use tracing::{trace, warn};

use crate::core::errors::{KeysmithError, Result};
use crate::core::models::keylist_mode::{KeylistMode, Protocol};
use crate::core::traits::engine::{ContextProvider, CryptoEngine};

/// An engine session owned by one caller at a time.
///
/// All operations take `&mut self`, so a context cannot be used from two
/// places at once. Moving it into a worker thread hands over ownership.
pub struct CryptoContext {
    engine: Box<dyn CryptoEngine>,
}

impl CryptoContext {
    /// Open a new session for `protocol`.
    pub fn new(provider: &dyn ContextProvider, protocol: Protocol) -> Result<Self> {
        let engine = provider.new_context(protocol)?;
        Ok(Self { engine })
    }

    /// Wrap an engine that is already open.
    #[cfg(test)]
    pub fn from_engine(engine: Box<dyn CryptoEngine>) -> Self {
        Self { engine }
    }

    pub fn protocol(&self) -> Protocol {
        self.engine.protocol()
    }

    pub fn keylist_mode(&self) -> KeylistMode {
        self.engine.keylist_mode()
    }

    /// Switch to `mode` until the returned guard is dropped.
    ///
    /// On error the mode is left untouched.
    pub fn scoped_mode(&mut self, mode: KeylistMode) -> Result<KeylistModeGuard<'_>> {
        let saved = self.engine.keylist_mode();
        self.engine
            .set_keylist_mode(mode)
            .map_err(|e| KeysmithError::ModeSwitch {
                detail: e.to_string(),
            })?;
        trace!(?saved, ?mode, "keylist mode switched");
        Ok(KeylistModeGuard {
            engine: self.engine.as_mut(),
            saved,
        })
    }

    /// Switch to local or remote listing, keeping other mode bits.
    pub fn scoped_source(&mut self, remote: bool) -> Result<KeylistModeGuard<'_>> {
        let mode = self.keylist_mode().for_source(remote);
        self.scoped_mode(mode)
    }

    pub fn engine(&mut self) -> &mut dyn CryptoEngine {
        self.engine.as_mut()
    }
}

/// Restores the keylist mode saved by [`CryptoContext::scoped_mode`] on drop.
pub struct KeylistModeGuard<'a> {
    engine: &'a mut (dyn CryptoEngine + 'static),
    saved: KeylistMode,
}

impl Deref for KeylistModeGuard<'_> {
    type Target = dyn CryptoEngine + 'static;

    fn deref(&self) -> &Self::Target {
        &*self.engine
    }
}

impl DerefMut for KeylistModeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.engine
    }
}

impl Drop for KeylistModeGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.engine.set_keylist_mode(self.saved) {
            warn!(mode = ?self.saved, error = %e, "failed to restore keylist mode");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::MockEngine;

    #[test]
    fn guard_restores_mode_on_drop() {
        let mut ctx = MockEngine::new().into_context();
        {
            let guard = ctx.scoped_source(true).unwrap();
            assert_eq!(guard.keylist_mode(), KeylistMode::EXTERN);
        }
        assert_eq!(ctx.keylist_mode(), KeylistMode::LOCAL);
    }

    #[test]
    fn failed_switch_is_a_mode_error() {
        let mut ctx = MockEngine::new().failing_mode_switch().into_context();
        let err = ctx.scoped_source(true).err().unwrap();
        assert!(matches!(err, KeysmithError::ModeSwitch { .. }));
        assert_eq!(ctx.keylist_mode(), KeylistMode::LOCAL);
    }

    #[test]
    fn unrelated_mode_bits_survive_scoping() {
        let mut ctx = MockEngine::new()
            .with_mode(KeylistMode::LOCAL | KeylistMode::EXTERN)
            .into_context();
        {
            let guard = ctx.scoped_source(false).unwrap();
            assert_eq!(guard.keylist_mode(), KeylistMode::LOCAL);
        }
        assert_eq!(ctx.keylist_mode(), KeylistMode::LOCAL | KeylistMode::EXTERN);
    }
}
