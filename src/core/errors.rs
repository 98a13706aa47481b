/// All domain errors for keysmith.
///
/// Engine failures keep the diagnostic text reported by GnuPG so the
/// message shown to the user says what actually went wrong.
#[derive(Debug, thiserror::Error)]
pub enum KeysmithError {
    #[error("Error setting key list mode: {detail}")]
    ModeSwitch { detail: String },

    #[error("{context}: {detail}")]
    Engine { context: String, detail: String },

    #[error("Invalid key data: {detail}")]
    InvalidData { detail: String },

    #[error(
        "No key found for “{pattern}”\n\n  \
         Check the fingerprint, or fetch the key first:\n    \
         → keysmith search {pattern}"
    )]
    NotFound { pattern: String },

    #[error(
        "Ambiguous keys for “{pattern}”\n\n  \
         More than one key in the local key ring matches.\n  \
         Use the full 40 character fingerprint instead."
    )]
    Ambiguous { pattern: String },

    #[error("Cannot export minimal key for “{mailbox}”: {detail}")]
    Subprocess { mailbox: String, detail: String },

    /// A background key server search reported a failure.
    #[error("{message}")]
    KeyServer { message: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl KeysmithError {
    /// Shorthand for an engine failure with a context line.
    pub fn engine(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Engine {
            context: context.into(),
            detail: detail.into(),
        }
    }

    /// Replace the context line of an engine failure, keeping its detail.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        match self {
            Self::Engine { detail, .. } => Self::engine(context, detail),
            other => other,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KeysmithError>;
