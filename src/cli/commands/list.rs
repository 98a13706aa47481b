use crate::cli::context::AppContext;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::services::key_lister::KeyLister;
use crate::core::services::key_validator::KeyValidator;

/// Execute the `keysmith list` command.
///
/// Lists local keys by default, or searches the key server with `--remote`.
/// Unusable keys are counted but hidden unless `--all` is given.
pub fn execute(
    app: &AppContext,
    pattern: Option<&str>,
    secret: bool,
    remote: bool,
    all: bool,
    json: bool,
) -> Result<()> {
    let pattern = pattern.unwrap_or_default();
    let mut ctx = app.open()?;

    let spinner = remote.then(|| output::spinner("Searching the key server..."));
    let listing = KeyLister::list_keys(&mut ctx, pattern, secret, remote, all);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let listing = listing?;

    if json {
        let rendered = serde_json::to_string_pretty(&listing).map_err(std::io::Error::from)?;
        println!("{rendered}");
        return Ok(());
    }

    let source = if remote { "key server" } else { "local key ring" };
    output::header(&format!("{} keys from the {source}", ctx.protocol()));

    if listing.keys.is_empty() {
        output::warning("No keys found");
    }
    let now = chrono::Utc::now().timestamp();
    for key in &listing.keys {
        output::key_line(key, KeyValidator::is_usable(key, secret, remote, now));
    }

    if listing.bad > 0 {
        output::info(&format!(
            "{} unusable key(s) hidden. Use --all to show them.",
            listing.bad
        ));
    }
    Ok(())
}
