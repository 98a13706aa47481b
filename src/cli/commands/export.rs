use std::path::Path;

use crate::cli::context::AppContext;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::services::key_exporter::KeyExporter;
use crate::core::services::key_loader::KeyLoader;

/// Execute the `keysmith export` command.
///
/// Without `mailbox`, writes the ASCII-armored key. With it, writes the
/// base64 of a minimal key that only carries that mailbox's user ids.
pub fn execute(
    app: &AppContext,
    fingerprint: &str,
    output_path: Option<&Path>,
    mailbox: Option<&str>,
) -> Result<()> {
    let data = match mailbox {
        Some(mailbox) => {
            let mut encoded =
                KeyExporter::export_minimal(app.provider.as_ref(), fingerprint, mailbox)?;
            encoded.push('\n');
            encoded.into_bytes()
        }
        None => {
            let mut ctx = app.open()?;
            let key = KeyLoader::load_key(&mut ctx, fingerprint)?;
            let name = key
                .primary_uid()
                .map(|u| u.uid.clone())
                .unwrap_or_else(|| key.fingerprint.clone());
            KeyExporter::export_armored(&mut ctx, &key, &name)?
        }
    };

    match output_path {
        Some(path) => {
            std::fs::write(path, &data)?;
            output::success(&format!("Key {fingerprint} written to {}", path.display()));
        }
        None => {
            use std::io::Write;
            std::io::stdout().lock().write_all(&data)?;
        }
    }
    Ok(())
}
