// Scripted engine used by the service tests.

#![cfg(test)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::errors::{KeysmithError, Result};
use crate::core::models::engine_info::EngineCapabilities;
use crate::core::models::import_result::ImportResult;
use crate::core::models::key::{Key, KeyRef, Subkey, UserId};
use crate::core::models::keylist_mode::{KeylistMode, Protocol};
use crate::core::services::crypto_context::CryptoContext;
use crate::core::traits::engine::{ContextProvider, CryptoEngine, DataBuffer};

/// Calls observed by a mock engine, readable after the engine moved away.
#[derive(Debug, Default)]
pub struct MockLog {
    /// (pattern, mode, secret) of every started listing.
    pub listings: Vec<(String, KeylistMode, bool)>,
    pub imported_keys: Vec<String>,
    pub raw_imports: Vec<Vec<u8>>,
    pub spawned: Vec<(PathBuf, Vec<String>)>,
    pub armor: Option<bool>,
}

#[derive(Clone)]
pub struct MockEngine {
    mode: KeylistMode,
    fail_mode_switch: bool,
    fail_start: bool,
    fail_after: Option<usize>,
    local: Vec<KeyRef>,
    remote: Vec<KeyRef>,
    import: std::result::Result<ImportResult, String>,
    export: Vec<u8>,
    spawn_output: std::result::Result<Vec<u8>, String>,
    caps: EngineCapabilities,
    queue: VecDeque<KeyRef>,
    served: usize,
    log: Arc<Mutex<MockLog>>,
    live: Option<Arc<AtomicUsize>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            mode: KeylistMode::LOCAL,
            fail_mode_switch: false,
            fail_start: false,
            fail_after: None,
            local: Vec::new(),
            remote: Vec::new(),
            import: Ok(ImportResult::default()),
            export: Vec::new(),
            spawn_output: Ok(Vec::new()),
            caps: EngineCapabilities::from_version(
                PathBuf::from("/usr/bin/gpg"),
                Some(semver::Version::new(2, 4, 4)),
            ),
            queue: VecDeque::new(),
            served: 0,
            log: Arc::default(),
            live: None,
        }
    }

    pub fn with_mode(mut self, mode: KeylistMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn failing_mode_switch(mut self) -> Self {
        self.fail_mode_switch = true;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Return an engine error after `n` keys were served.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn with_local(mut self, keys: &[KeyRef]) -> Self {
        self.local = keys.to_vec();
        self
    }

    pub fn with_remote(mut self, keys: &[KeyRef]) -> Self {
        self.remote = keys.to_vec();
        self
    }

    pub fn with_import(mut self, result: ImportResult) -> Self {
        self.import = Ok(result);
        self
    }

    pub fn failing_import(mut self, detail: &str) -> Self {
        self.import = Err(detail.to_string());
        self
    }

    pub fn with_export(mut self, bytes: &[u8]) -> Self {
        self.export = bytes.to_vec();
        self
    }

    pub fn with_spawn_output(mut self, bytes: &[u8]) -> Self {
        self.spawn_output = Ok(bytes.to_vec());
        self
    }

    pub fn failing_spawn(mut self, detail: &str) -> Self {
        self.spawn_output = Err(detail.to_string());
        self
    }

    pub fn with_capabilities(mut self, caps: EngineCapabilities) -> Self {
        self.caps = caps;
        self
    }

    pub fn log(&self) -> Arc<Mutex<MockLog>> {
        Arc::clone(&self.log)
    }

    pub fn into_context(self) -> CryptoContext {
        CryptoContext::from_engine(Box::new(self))
    }

    fn record(&self) -> std::sync::MutexGuard<'_, MockLog> {
        self.log.lock().unwrap()
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        if let Some(live) = &self.live {
            live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

fn matches(key: &Key, pattern: &str) -> bool {
    pattern.is_empty()
        || key
            .fingerprint
            .to_ascii_uppercase()
            .ends_with(&pattern.to_ascii_uppercase())
        || key.subkeys.iter().any(|s| s.fingerprint.eq_ignore_ascii_case(pattern))
}

impl CryptoEngine for MockEngine {
    fn protocol(&self) -> Protocol {
        Protocol::OpenPgp
    }

    fn keylist_mode(&self) -> KeylistMode {
        self.mode
    }

    fn set_keylist_mode(&mut self, mode: KeylistMode) -> Result<()> {
        if self.fail_mode_switch {
            return Err(KeysmithError::engine("mock", "mode switch refused"));
        }
        self.mode = mode;
        Ok(())
    }

    fn keylist_start(&mut self, pattern: &str, secret: bool) -> Result<()> {
        self.record()
            .listings
            .push((pattern.to_string(), self.mode, secret));
        if self.fail_start {
            return Err(KeysmithError::engine("could not list keys", "mock start failure"));
        }
        let source = if self.mode.contains(KeylistMode::EXTERN) {
            &self.remote
        } else {
            &self.local
        };
        self.queue = source
            .iter()
            .filter(|k| matches(k, pattern))
            .cloned()
            .collect();
        self.served = 0;
        Ok(())
    }

    fn keylist_next(&mut self) -> Result<Option<KeyRef>> {
        if self.fail_after == Some(self.served) {
            return Err(KeysmithError::engine("could not list keys", "mock listing failure"));
        }
        let next = self.queue.pop_front();
        if next.is_some() {
            self.served += 1;
        }
        Ok(next)
    }

    fn keylist_end(&mut self) {
        self.queue.clear();
    }

    fn import(&mut self, data: &[u8]) -> Result<ImportResult> {
        self.record().raw_imports.push(data.to_vec());
        self.import
            .clone()
            .map_err(|e| KeysmithError::engine("importing key data failed", e))
    }

    fn import_keys(&mut self, keys: &[KeyRef]) -> Result<ImportResult> {
        self.record()
            .imported_keys
            .extend(keys.iter().map(|k| k.fingerprint.clone()));
        self.import
            .clone()
            .map_err(|e| KeysmithError::engine("error importing key", e))
    }

    fn set_armor(&mut self, armor: bool) {
        self.record().armor = Some(armor);
    }

    fn export_keys(&mut self, _keys: &[KeyRef], out: &mut DataBuffer) -> Result<()> {
        use std::io::Write;
        out.write_all(&self.export)?;
        Ok(())
    }

    fn spawn(&mut self, program: &Path, args: &[String], out: &mut DataBuffer) -> Result<()> {
        use std::io::Write;
        self.record()
            .spawned
            .push((program.to_path_buf(), args.to_vec()));
        match &self.spawn_output {
            Ok(bytes) => {
                out.write_all(bytes)?;
                Ok(())
            }
            Err(detail) => Err(KeysmithError::engine("gpg failed", detail.clone())),
        }
    }

    fn capabilities(&self) -> Result<EngineCapabilities> {
        Ok(self.caps.clone())
    }
}

/// Hands out clones of a template engine and counts the live ones.
pub struct MockProvider {
    template: MockEngine,
    live: Arc<AtomicUsize>,
    refuse: bool,
}

impl MockProvider {
    pub fn new(template: MockEngine) -> Self {
        Self {
            template,
            live: Arc::new(AtomicUsize::new(0)),
            refuse: false,
        }
    }

    pub fn refusing(mut self) -> Self {
        self.refuse = true;
        self
    }

    /// Number of contexts created and not yet dropped.
    pub fn live_contexts(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Arc<Mutex<MockLog>> {
        self.template.log()
    }
}

impl ContextProvider for MockProvider {
    fn new_context(&self, _protocol: Protocol) -> Result<Box<dyn CryptoEngine>> {
        if self.refuse {
            return Err(KeysmithError::engine("could not create context", "no engine"));
        }
        let mut engine = self.template.clone();
        self.live.fetch_add(1, Ordering::SeqCst);
        engine.live = Some(Arc::clone(&self.live));
        Ok(Box::new(engine))
    }
}

/// A subkey usable for encryption, never expiring.
pub fn encryption_subkey(fpr: &str) -> Subkey {
    Subkey {
        fingerprint: fpr.to_string(),
        key_id: fpr[fpr.len().saturating_sub(16)..].to_string(),
        can_encrypt: true,
        ..Default::default()
    }
}

/// A subkey usable for signing, never expiring.
pub fn signing_subkey(fpr: &str) -> Subkey {
    Subkey {
        can_encrypt: false,
        can_sign: true,
        ..encryption_subkey(fpr)
    }
}

/// A clean key with a signing primary and an encryption subkey.
pub fn usable_key(fpr: &str) -> KeyRef {
    Arc::new(Key {
        fingerprint: fpr.to_string(),
        subkeys: vec![signing_subkey(fpr), encryption_subkey(&format!("{fpr}E"))],
        user_ids: vec![UserId {
            uid: "Test <test@example.org>".into(),
            mailbox: Some("test@example.org".into()),
            ..Default::default()
        }],
        ..Default::default()
    })
}

/// A key whose only flag is `revoked`.
pub fn revoked_key(fpr: &str) -> KeyRef {
    let mut key = (*usable_key(fpr)).clone();
    key.revoked = true;
    Arc::new(key)
}
