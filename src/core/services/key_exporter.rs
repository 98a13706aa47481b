use std::io::{Read, Seek, SeekFrom};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info};

use crate::core::errors::{KeysmithError, Result};
use crate::core::models::engine_info::EngineCapabilities;
use crate::core::models::key::KeyRef;
use crate::core::models::keylist_mode::Protocol;
use crate::core::services::crypto_context::CryptoContext;
use crate::core::traits::engine::{ContextProvider, DataBuffer};

/// Exports public keys, armored or minimal.
pub struct KeyExporter;

impl KeyExporter {
    /// Export `key` as an ASCII-armored public key block.
    ///
    /// `name` only appears in error messages.
    pub fn export_armored(ctx: &mut CryptoContext, key: &KeyRef, name: &str) -> Result<Vec<u8>> {
        let engine = ctx.engine();
        engine.set_armor(true);

        let mut buffer = DataBuffer::default();
        engine
            .export_keys(std::slice::from_ref(key), &mut buffer)
            .map_err(|e| e.with_context(format!("Exporting key for “{name}” failed")))?;

        let size = buffer.seek(SeekFrom::End(0))?;
        buffer.seek(SeekFrom::Start(0))?;
        let mut armored = Vec::with_capacity(size as usize);
        buffer.read_to_end(&mut armored)?;

        debug!(fingerprint = %key.fingerprint, bytes = armored.len(), "exported key");
        Ok(armored)
    }

    /// Arguments for a minimal export of `fingerprint`, keeping only the user
    /// ids for `mailbox` and the subkeys that can sign or encrypt, as far as
    /// the engine supports those filters.
    pub fn minimal_export_args(
        caps: &EngineCapabilities,
        fingerprint: &str,
        mailbox: &str,
    ) -> Vec<String> {
        let mut args: Vec<String> = [
            "--export",
            "--export-options",
            "export-minimal,no-export-attributes",
        ]
        .map(String::from)
        .to_vec();
        if caps.export_filter_subkey {
            args.push("--export-filter".into());
            args.push("drop-subkey=usage!~e && usage!~s".into());
        }
        if caps.export_filter_uid {
            args.push("--export-filter".into());
            args.push(format!("keep-uid=mbox={mailbox}"));
        }
        args.push(fingerprint.to_string());
        args
    }

    /// Export a stripped-down key for `mailbox`, base64 encoded.
    ///
    /// Runs the OpenPGP engine as a subprocess since the filters are not
    /// reachable through the regular export operation.
    pub fn export_minimal(
        provider: &dyn ContextProvider,
        fingerprint: &str,
        mailbox: &str,
    ) -> Result<String> {
        let mut ctx = CryptoContext::new(provider, Protocol::Spawn)?;
        let engine = ctx.engine();
        let caps = engine.capabilities()?;
        let args = KeyExporter::minimal_export_args(&caps, fingerprint, mailbox);

        let mut buffer = DataBuffer::default();
        engine
            .spawn(&caps.gpg_path, &args, &mut buffer)
            .map_err(|e| KeysmithError::Subprocess {
                mailbox: mailbox.to_string(),
                detail: e.to_string(),
            })?;

        let exported = buffer.into_inner();
        if exported.is_empty() {
            return Err(KeysmithError::Subprocess {
                mailbox: mailbox.to_string(),
                detail: "the engine returned no key data".into(),
            });
        }
        info!(fingerprint, mailbox, bytes = exported.len(), "exported minimal key");
        Ok(STANDARD.encode(exported))
    }
}
