use std::path::PathBuf;

/// What the installed OpenPGP engine can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCapabilities {
    /// Path of the `gpg` executable.
    pub gpg_path: PathBuf,
    pub version: Option<semver::Version>,
    /// `--export-filter drop-subkey=...` is understood.
    pub export_filter_subkey: bool,
    /// `--export-filter keep-uid=...` is understood.
    pub export_filter_uid: bool,
}

impl EngineCapabilities {
    /// Derive filter support from the reported GnuPG version.
    pub fn from_version(gpg_path: PathBuf, version: Option<semver::Version>) -> Self {
        let at_least = |min: semver::Version| version.as_ref().is_some_and(|v| *v >= min);
        Self {
            export_filter_subkey: at_least(semver::Version::new(2, 2, 9)),
            export_filter_uid: at_least(semver::Version::new(2, 1, 14)),
            gpg_path,
            version,
        }
    }
}
