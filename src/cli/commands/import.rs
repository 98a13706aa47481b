use std::io::Read;
use std::path::Path;

use crate::cli::context::AppContext;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::services::key_importer::KeyImporter;

/// Execute the `keysmith import` command.
///
/// Reads `file` (or standard input for `-`) and imports every key in it.
pub fn execute(app: &AppContext, file: &Path) -> Result<()> {
    let data = if file == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().lock().read_to_end(&mut buf)?;
        buf
    } else {
        std::fs::read(file)?
    };

    let mut ctx = app.open()?;
    let info = KeyImporter::import_raw(&mut ctx, &data, is_armored(&data))?;

    if info.result.considered == 0 {
        output::warning(&info.summary);
    } else {
        output::success(&info.summary);
    }
    Ok(())
}

/// ASCII armor starts with a `-----BEGIN` line, possibly after whitespace.
fn is_armored(data: &[u8]) -> bool {
    data.trim_ascii_start().starts_with(b"-----BEGIN ")
}
