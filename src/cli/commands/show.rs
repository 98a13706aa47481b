use crate::cli::context::AppContext;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::services::key_loader::KeyLoader;

/// Execute the `keysmith show` command.
pub fn execute(app: &AppContext, fingerprint: &str, json: bool) -> Result<()> {
    let mut ctx = app.open()?;
    let key = KeyLoader::load_key(&mut ctx, fingerprint)?;

    if json {
        let rendered = serde_json::to_string_pretty(&*key).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        output::key_detail(&key);
    }
    Ok(())
}
