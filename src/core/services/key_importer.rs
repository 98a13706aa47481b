use tracing::{debug, info};

use crate::core::errors::{KeysmithError, Result};
use crate::core::models::import_result::ImportInfo;
use crate::core::models::key::KeyRef;
use crate::core::services::crypto_context::CryptoContext;
use crate::core::services::import_summary::ImportSummary;
use crate::core::services::key_loader::KeyLoader;

/// Brings key material into the local key ring.
pub struct KeyImporter;

impl KeyImporter {
    /// Import binary or ASCII-armored key material into the local key ring.
    ///
    /// Armored material is text: it ends at the first NUL byte, if any.
    pub fn import_raw(ctx: &mut CryptoContext, data: &[u8], armored: bool) -> Result<ImportInfo> {
        let data = if armored {
            data.split(|b| *b == 0).next().unwrap_or_default()
        } else {
            data
        };
        if data.is_empty() {
            return Err(KeysmithError::InvalidData {
                detail: "the key buffer is empty".into(),
            });
        }

        let result = ctx
            .engine()
            .import(data)
            .map_err(|e| e.with_context("Importing key data failed"))?;
        info!(
            bytes = data.len(),
            armored,
            considered = result.considered,
            imported = result.imported,
            "imported key data"
        );
        Ok(ImportInfo {
            summary: ImportSummary::summarize(&result),
            result,
        })
    }

    /// Import or update `key`, typically one found on a key server.
    ///
    /// If the engine considered the key, the possibly changed key is loaded
    /// back from the local key ring and returned as well. That reload is best
    /// effort: its failure does not fail the import.
    pub fn import_key(
        ctx: &mut CryptoContext,
        key: &KeyRef,
    ) -> Result<(ImportInfo, Option<KeyRef>)> {
        let result = ctx
            .engine()
            .import_keys(std::slice::from_ref(key))
            .map_err(|e| e.with_context("Error importing key"))?;
        info!(
            fingerprint = %key.fingerprint,
            considered = result.considered,
            imported = result.imported,
            unchanged = result.unchanged,
            "imported key"
        );

        let updated = match key.subkeys.first() {
            Some(primary) if result.considered != 0 => {
                match KeyLoader::load_key(ctx, &primary.fingerprint) {
                    Ok(updated) => Some(updated),
                    Err(e) => {
                        debug!(
                            fingerprint = %primary.fingerprint,
                            error = %e,
                            "could not reload imported key"
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        Ok((
            ImportInfo {
                summary: ImportSummary::summarize(&result),
                result,
            },
            updated,
        ))
    }
}
