pub mod commands;
pub mod context;
pub mod event_loop;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::models::keylist_mode::Protocol;

/// Find, import, export and fetch OpenPGP and S/MIME keys.
#[derive(Parser, Debug)]
#[command(name = "keysmith", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Key protocol to operate on
    #[arg(long, global = true, value_enum, default_value_t = Protocol::OpenPgp)]
    pub protocol: Protocol,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode: only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to alternative config file
    #[arg(long, global = true, env = "KEYSMITH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List keys from the local key ring or a key server
    List {
        /// Fingerprint, key id, mailbox or name to match (default: all keys)
        pattern: Option<String>,
        /// List secret keys only
        #[arg(long, conflicts_with = "remote")]
        secret: bool,
        /// Search the configured key server instead of the local key ring
        #[arg(long)]
        remote: bool,
        /// Also show revoked, expired, disabled and otherwise unusable keys
        #[arg(long)]
        all: bool,
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single key from the local key ring
    Show {
        /// Fingerprint of the key
        fingerprint: String,
        /// Print the key as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import key material from a file or standard input
    Import {
        /// File with binary or armored keys; `-` reads standard input
        file: PathBuf,
    },

    /// Export a public key
    Export {
        /// Fingerprint of the key
        fingerprint: String,
        /// Write to this file instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Export a stripped key for one mailbox, base64 encoded
        #[arg(long, requires = "mailbox")]
        minimal: bool,
        /// Mailbox whose user ids are kept in a minimal export
        #[arg(long, requires = "minimal")]
        mailbox: Option<String>,
    },

    /// Look up a fingerprint on the key server and import the match
    Search {
        /// Fingerprint or key id to look up
        fingerprint: String,
    },
}
