use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, OnceLock};
use std::thread;

use tracing::{debug, trace};

use super::colon_listing::{parse_keyring_listing, parse_search_listing};
use super::status::parse_import_result;
use crate::core::errors::{KeysmithError, Result};
use crate::core::models::engine_info::EngineCapabilities;
use crate::core::models::import_result::ImportResult;
use crate::core::models::key::KeyRef;
use crate::core::models::keylist_mode::{KeylistMode, Protocol};
use crate::core::traits::engine::{ContextProvider, CryptoEngine, DataBuffer};

/// Where the engine binaries live and how they are configured.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub gpg_path: PathBuf,
    pub gpgsm_path: PathBuf,
    /// Exported as `GNUPGHOME` to every engine process.
    pub homedir: Option<PathBuf>,
    pub keyserver: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            gpg_path: PathBuf::from("gpg"),
            gpgsm_path: PathBuf::from("gpgsm"),
            homedir: None,
            keyserver: None,
        }
    }
}

/// Creates [`GpgEngine`] sessions sharing one set of settings.
///
/// The version check runs at most once per provider.
pub struct GpgContextProvider {
    settings: Arc<EngineSettings>,
    capabilities: Arc<OnceLock<EngineCapabilities>>,
}

impl GpgContextProvider {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            capabilities: Arc::new(OnceLock::new()),
        }
    }
}

impl ContextProvider for GpgContextProvider {
    fn new_context(&self, protocol: Protocol) -> Result<Box<dyn CryptoEngine>> {
        debug!(%protocol, "creating engine context");
        Ok(Box::new(GpgEngine {
            settings: Arc::clone(&self.settings),
            capabilities: Arc::clone(&self.capabilities),
            protocol,
            mode: KeylistMode::LOCAL,
            armor: false,
            pending: None,
        }))
    }
}

/// How the output of a listing command must be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListingFormat {
    Keyring,
    Search,
}

/// Captured result of one engine process.
struct Captured {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: String,
}

/// Engine session that shells out to `gpg` or `gpgsm`.
///
/// Each operation is a separate process; the session itself only holds the
/// keylist mode, the armor flag and the keys of an open listing.
pub struct GpgEngine {
    settings: Arc<EngineSettings>,
    capabilities: Arc<OnceLock<EngineCapabilities>>,
    protocol: Protocol,
    mode: KeylistMode,
    armor: bool,
    pending: Option<VecDeque<KeyRef>>,
}

impl GpgEngine {
    fn program(&self) -> Result<&Path> {
        match self.protocol {
            Protocol::OpenPgp => Ok(&self.settings.gpg_path),
            Protocol::Cms => Ok(&self.settings.gpgsm_path),
            Protocol::Spawn => Err(KeysmithError::engine(
                "Unsupported operation",
                "spawn contexts can only run subprocesses",
            )),
        }
    }

    fn keyserver_args(&self) -> Vec<String> {
        match &self.settings.keyserver {
            Some(url) => vec!["--keyserver".into(), url.clone()],
            None => Vec::new(),
        }
    }

    /// Command line for listing `pattern` in the current mode.
    fn listing_args(&self, pattern: &str, secret: bool) -> Result<(Vec<String>, ListingFormat)> {
        let remote = self.mode.contains(KeylistMode::EXTERN);

        if secret && remote {
            return Err(KeysmithError::engine(
                "Unsupported operation",
                "secret keys cannot be listed from a key server",
            ));
        }
        if remote && pattern.is_empty() {
            return Err(KeysmithError::engine(
                "Unsupported operation",
                "a key server search needs a pattern",
            ));
        }

        let mut args: Vec<String> = ["--batch", "--with-colons"].map(String::from).to_vec();
        let format = match (self.protocol, remote) {
            (Protocol::OpenPgp, true) => {
                args.extend(self.keyserver_args());
                args.push("--search-keys".into());
                ListingFormat::Search
            }
            (Protocol::Cms, true) => {
                args.extend(["--with-fingerprint", "--list-external-keys"].map(String::from));
                ListingFormat::Keyring
            }
            _ => {
                // gpgsm has no --fixed-list-mode
                if self.protocol == Protocol::OpenPgp {
                    args.push("--fixed-list-mode".into());
                }
                args.push("--with-fingerprint".into());
                args.push(if secret { "--list-secret-keys" } else { "--list-keys" }.into());
                ListingFormat::Keyring
            }
        };
        args.push("--".into());
        if !pattern.is_empty() {
            args.push(pattern.to_string());
        }
        Ok((args, format))
    }

    fn run(&self, program: &Path, args: &[String], stdin_data: Option<&[u8]>) -> Result<Captured> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .env("LANGUAGE", "C")
            .env("LC_MESSAGES", "C")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(home) = &self.settings.homedir {
            cmd.env("GNUPGHOME", home);
        }
        cmd.stdin(if stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        trace!(program = %program.display(), ?args, "running engine");
        let mut child = cmd.spawn().map_err(|e| {
            KeysmithError::engine(format!("Failed to run {}", program.display()), e.to_string())
        })?;

        // stdin is fed from its own thread while stdout and stderr drain
        let stdin = child.stdin.take();
        let (output, written) = thread::scope(|scope| {
            let writer = stdin_data
                .zip(stdin)
                .map(|(data, mut stdin)| scope.spawn(move || stdin.write_all(data)));
            let output = child.wait_with_output();
            let written = match writer {
                Some(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked"))),
                None => Ok(()),
            };
            (output, written)
        });

        let output = output.map_err(|e| {
            KeysmithError::engine(format!("{} process failed", program.display()), e.to_string())
        })?;
        // an engine that exits before reading all input reports why on stderr
        match written {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
                return Err(KeysmithError::engine(
                    format!("Failed to write to {} stdin", program.display()),
                    e.to_string(),
                ));
            }
            _ => {}
        }

        Ok(Captured {
            status: output.status,
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    /// Run an import command and read the counters from its status output.
    ///
    /// GnuPG exits with an error when some keys were rejected but still
    /// reports the counters, so the status line decides success.
    fn run_import(&self, args: &[String], stdin_data: Option<&[u8]>) -> Result<ImportResult> {
        let captured = self.run(self.program()?, args, stdin_data)?;
        let status = String::from_utf8_lossy(&captured.stdout);
        match parse_import_result(&status) {
            Some(result) => Ok(result),
            None => Err(KeysmithError::engine(
                "Import failed",
                failure_detail(&captured),
            )),
        }
    }

    fn export_raw(&self, fingerprints: &[&str], armor: bool) -> Result<Vec<u8>> {
        let mut args = vec!["--batch".to_string()];
        if armor {
            args.push("--armor".into());
        }
        args.extend(["--export", "--"].map(String::from));
        args.extend(fingerprints.iter().map(|f| f.to_string()));

        let captured = self.run(self.program()?, &args, None)?;
        if !captured.status.success() {
            return Err(KeysmithError::engine("Export failed", failure_detail(&captured)));
        }
        if captured.stdout.is_empty() {
            return Err(KeysmithError::engine(
                "Export failed",
                format!("no key material for {}", fingerprints.join(", ")),
            ));
        }
        Ok(captured.stdout)
    }

    fn detect_capabilities(&self) -> Result<EngineCapabilities> {
        let gpg_path = self.settings.gpg_path.clone();
        let captured = self.run(&gpg_path, &["--version".to_string()], None)?;
        if !captured.status.success() {
            return Err(KeysmithError::engine(
                "Could not determine the GnuPG version",
                failure_detail(&captured),
            ));
        }
        let version = parse_gpg_version(&String::from_utf8_lossy(&captured.stdout));
        debug!(?version, "detected engine version");
        Ok(EngineCapabilities::from_version(gpg_path, version))
    }
}

impl CryptoEngine for GpgEngine {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn keylist_mode(&self) -> KeylistMode {
        self.mode
    }

    fn set_keylist_mode(&mut self, mode: KeylistMode) -> Result<()> {
        if mode.is_empty() {
            return Err(KeysmithError::engine("Invalid mode", "no key source selected"));
        }
        if self.protocol == Protocol::Cms && mode.contains(KeylistMode::LOCAL | KeylistMode::EXTERN)
        {
            return Err(KeysmithError::engine(
                "Invalid mode",
                "S/MIME cannot combine local and external listings",
            ));
        }
        self.mode = mode;
        Ok(())
    }

    fn keylist_start(&mut self, pattern: &str, secret: bool) -> Result<()> {
        self.pending = None;
        let program = self.program()?.to_path_buf();
        let (args, format) = self.listing_args(pattern, secret)?;
        let captured = self.run(&program, &args, None)?;
        let stdout = String::from_utf8_lossy(&captured.stdout);

        if !captured.status.success() && !is_empty_listing(&captured.stderr) {
            return Err(KeysmithError::engine(
                "Key listing failed",
                failure_detail(&captured),
            ));
        }

        let keys = match format {
            ListingFormat::Keyring => parse_keyring_listing(&stdout, self.protocol),
            ListingFormat::Search => parse_search_listing(&stdout),
        };
        debug!(pattern, mode = ?self.mode, count = keys.len(), "listed keys");
        self.pending = Some(keys.into_iter().map(Arc::new).collect());
        Ok(())
    }

    fn keylist_next(&mut self) -> Result<Option<KeyRef>> {
        match self.pending.as_mut() {
            Some(keys) => Ok(keys.pop_front()),
            None => Err(KeysmithError::engine(
                "Key listing failed",
                "no listing in progress",
            )),
        }
    }

    fn keylist_end(&mut self) {
        self.pending = None;
    }

    fn import(&mut self, data: &[u8]) -> Result<ImportResult> {
        let args = ["--batch", "--status-fd", "1", "--import"].map(String::from);
        self.run_import(&args, Some(data))
    }

    fn import_keys(&mut self, keys: &[KeyRef]) -> Result<ImportResult> {
        let (remote, local): (Vec<&KeyRef>, Vec<&KeyRef>) = keys.iter().partition(|k| k.remote);
        let mut total = ImportResult::default();

        if !remote.is_empty() {
            if self.protocol != Protocol::OpenPgp {
                return Err(KeysmithError::engine(
                    "Unsupported operation",
                    "key server results can only be imported for OpenPGP",
                ));
            }
            let mut args: Vec<String> =
                ["--batch", "--status-fd", "1"].map(String::from).to_vec();
            args.extend(self.keyserver_args());
            args.push("--recv-keys".into());
            args.extend(remote.iter().map(|k| k.fingerprint.clone()));
            total += self.run_import(&args, None)?;
        }

        if !local.is_empty() {
            let fingerprints: Vec<&str> = local.iter().map(|k| k.fingerprint.as_str()).collect();
            let data = self.export_raw(&fingerprints, false)?;
            total += self.import(&data)?;
        }
        Ok(total)
    }

    fn set_armor(&mut self, armor: bool) {
        self.armor = armor;
    }

    fn export_keys(&mut self, keys: &[KeyRef], out: &mut DataBuffer) -> Result<()> {
        let fingerprints: Vec<&str> = keys.iter().map(|k| k.fingerprint.as_str()).collect();
        let data = self.export_raw(&fingerprints, self.armor)?;
        out.write_all(&data)?;
        Ok(())
    }

    fn spawn(&mut self, program: &Path, args: &[String], out: &mut DataBuffer) -> Result<()> {
        let captured = self.run(program, args, None)?;
        if !captured.status.success() {
            return Err(KeysmithError::engine(
                format!("{} failed", program.display()),
                failure_detail(&captured),
            ));
        }
        out.write_all(&captured.stdout)?;
        Ok(())
    }

    fn capabilities(&self) -> Result<EngineCapabilities> {
        if let Some(caps) = self.capabilities.get() {
            return Ok(caps.clone());
        }
        let caps = self.detect_capabilities()?;
        let _ = self.capabilities.set(caps.clone());
        Ok(caps)
    }
}

/// GnuPG reports "nothing matched" as a failure.
fn is_empty_listing(stderr: &str) -> bool {
    ["No public key", "No secret key", "not found", "No data"]
        .iter()
        .any(|marker| stderr.contains(marker))
}

fn failure_detail(captured: &Captured) -> String {
    if captured.stderr.is_empty() {
        format!("engine exited with {}", captured.status)
    } else {
        captured.stderr.clone()
    }
}

/// Version from the first line of `gpg --version`, e.g. `gpg (GnuPG) 2.4.4`.
fn parse_gpg_version(output: &str) -> Option<semver::Version> {
    let token = output.lines().next()?.split_whitespace().last()?;
    let core: String = token
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let mut parts: Vec<&str> = core.split('.').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        return None;
    }
    parts.resize(3, "0");
    semver::Version::parse(&parts[..3].join(".")).ok()
}
