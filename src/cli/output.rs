use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::core::models::key::Key;
use crate::core::models::presentation::Presentation;

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress everything but errors and requested data.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print a success message.
pub fn success(msg: &str) {
    if !quiet() {
        println!("  {} {}", "✓".green(), msg);
    }
}

/// Print an informational message.
pub fn info(msg: &str) {
    if !quiet() {
        println!("  {} {}", "•".cyan(), msg);
    }
}

/// Print a warning message.
pub fn warning(msg: &str) {
    if !quiet() {
        println!("  {} {}", "⚠".yellow(), msg);
    }
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("  {} {}", "✗".red(), msg);
}

/// Print a header line.
pub fn header(msg: &str) {
    if !quiet() {
        println!("\n{}", msg.bold());
    }
}

/// Start a spinner on stderr. Hidden when stderr is not a terminal.
pub fn spinner(msg: &str) -> ProgressBar {
    if quiet() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(msg.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// One line per key: status marker, fingerprint, primary user id.
pub fn key_line(key: &Key, usable: bool) {
    let marker = if usable { "✓".green() } else { "✗".red() };
    let uid = key.primary_uid().map(|u| u.uid.as_str()).unwrap_or("[no user id]");
    let mut flags = Vec::new();
    if key.secret {
        flags.push("secret");
    }
    if key.revoked {
        flags.push("revoked");
    }
    if key.expired {
        flags.push("expired");
    }
    if key.disabled {
        flags.push("disabled");
    }
    if key.invalid {
        flags.push("invalid");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", ")).yellow().to_string()
    };
    println!("  {} {}  {}{}", marker, key.fingerprint.cyan(), uid, flags);
}

/// Full key details: subkeys with capabilities and validity, then user ids.
pub fn key_detail(key: &Key) {
    println!("\n  {}  {}", "Key".bold(), key.fingerprint.cyan());
    println!("  Protocol: {}", key.protocol);
    if key.remote {
        println!("  Source:   key server");
    }

    for (i, sub) in key.subkeys.iter().enumerate() {
        let label = if i == 0 { "pub" } else { "sub" };
        let created = sub
            .created_at()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "?".into());
        let expires = match sub.expires_at() {
            Some(d) => format!("expires {}", d.format("%Y-%m-%d")),
            None => "no expiry".into(),
        };
        let mut state = Vec::new();
        if sub.revoked {
            state.push("revoked");
        }
        if sub.expired {
            state.push("expired");
        }
        if sub.disabled {
            state.push("disabled");
        }
        let state = if state.is_empty() {
            String::new()
        } else {
            format!(" [{}]", state.join(", ")).yellow().to_string()
        };
        println!(
            "  {label}  {} [{}] created {created}, {expires}{state}",
            sub.key_id,
            sub.capabilities()
        );
    }

    for uid in &key.user_ids {
        let state = if uid.revoked {
            " [revoked]".yellow().to_string()
        } else {
            String::new()
        };
        println!("  uid  {}{state}", uid.uid);
    }
}

/// Show the payload of a background operation.
pub fn present(payload: &Presentation) {
    match payload {
        Presentation::Info(msg) => info(msg),
        Presentation::Warning(msg) => warning(msg),
        Presentation::Error(msg) => error(msg),
        Presentation::KeyDetail { key, summary } => {
            success(summary);
            key_detail(key);
        }
    }
}
