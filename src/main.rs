mod adapters;
mod cli;
mod config;
mod core;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::context::AppContext;
use cli::{Cli, Commands};
use config::app_config::AppConfig;

fn main() {
    let args = Cli::parse();
    cli::output::set_quiet(args.quiet);

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            cli::output::error(&format!("Error: {e}"));
            std::process::exit(1);
        }
    };

    // KEYSMITH_LOG wins, then --verbose, then the config file
    let filter = EnvFilter::try_from_env("KEYSMITH_LOG").unwrap_or_else(|_| {
        if args.verbose {
            EnvFilter::new("keysmith=debug")
        } else {
            config
                .logging
                .level
                .as_deref()
                .and_then(|level| EnvFilter::try_new(level).ok())
                .unwrap_or_else(|| EnvFilter::new("keysmith=warn"))
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let app = AppContext::from_config(&config, args.protocol);

    let result = match &args.command {
        Commands::List {
            pattern,
            secret,
            remote,
            all,
            json,
        } => cli::commands::list::execute(&app, pattern.as_deref(), *secret, *remote, *all, *json),
        Commands::Show { fingerprint, json } => {
            cli::commands::show::execute(&app, fingerprint, *json)
        }
        Commands::Import { file } => cli::commands::import::execute(&app, file),
        Commands::Export {
            fingerprint,
            output,
            minimal: _,
            mailbox,
        } => cli::commands::export::execute(&app, fingerprint, output.as_deref(), mailbox.as_deref()),
        Commands::Search { fingerprint } => cli::commands::search::execute(&app, fingerprint),
    };

    if let Err(e) = result {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}
