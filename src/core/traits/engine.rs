use std::io::Cursor;
use std::path::Path;

use crate::core::errors::Result;
use crate::core::models::engine_info::EngineCapabilities;
use crate::core::models::import_result::ImportResult;
use crate::core::models::key::KeyRef;
use crate::core::models::keylist_mode::{KeylistMode, Protocol};

/// In-memory data buffer the engine reads from or writes into.
pub type DataBuffer = Cursor<Vec<u8>>;

/// Port for one session with the external crypto engine.
///
/// Implementations live in `adapters::engine` (e.g. GpgEngine).
/// The core layer only depends on this trait, never on a concrete engine.
/// A session carries mutable state (keylist mode, armor, an open listing),
/// so it must not be used by two callers at once.
pub trait CryptoEngine: Send {
    /// Protocol this session was created for.
    fn protocol(&self) -> Protocol;

    fn keylist_mode(&self) -> KeylistMode;

    fn set_keylist_mode(&mut self, mode: KeylistMode) -> Result<()>;

    /// Begin listing keys matching `pattern` (empty matches all).
    fn keylist_start(&mut self, pattern: &str, secret: bool) -> Result<()>;

    /// Next key of the open listing; `Ok(None)` once all keys were returned.
    fn keylist_next(&mut self) -> Result<Option<KeyRef>>;

    /// Close the listing, dropping any keys not yet fetched.
    fn keylist_end(&mut self);

    /// Import binary or armored key material into the local key ring.
    fn import(&mut self, data: &[u8]) -> Result<ImportResult>;

    /// Import keys obtained from a listing, e.g. from a key server.
    fn import_keys(&mut self, keys: &[KeyRef]) -> Result<ImportResult>;

    fn set_armor(&mut self, armor: bool);

    /// Write the given keys to `out`.
    fn export_keys(&mut self, keys: &[KeyRef], out: &mut DataBuffer) -> Result<()>;

    /// Run `program` with `args`, capturing its standard output in `out`.
    fn spawn(&mut self, program: &Path, args: &[String], out: &mut DataBuffer) -> Result<()>;

    /// Describe the installed OpenPGP engine.
    fn capabilities(&self) -> Result<EngineCapabilities>;
}

/// Port for creating engine sessions.
pub trait ContextProvider: Send + Sync {
    fn new_context(&self, protocol: Protocol) -> Result<Box<dyn CryptoEngine>>;
}
