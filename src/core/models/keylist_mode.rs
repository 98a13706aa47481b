use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Source selection for key enumeration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeylistMode: u32 {
        /// The local key ring.
        const LOCAL = 1;
        /// The configured key server.
        const EXTERN = 2;
    }
}

impl KeylistMode {
    /// Mode for listing from the given source, keeping unrelated bits of `self`.
    pub fn for_source(self, remote: bool) -> Self {
        if remote {
            (self - Self::LOCAL) | Self::EXTERN
        } else {
            (self - Self::EXTERN) | Self::LOCAL
        }
    }
}

impl Default for KeylistMode {
    fn default() -> Self {
        Self::LOCAL
    }
}

/// Engine protocol a context is bound to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    #[value(name = "openpgp")]
    OpenPgp,
    /// S/MIME (X.509) via gpgsm.
    Cms,
    /// Raw subprocess execution, no key operations.
    #[value(skip)]
    Spawn,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::OpenPgp => write!(f, "OpenPGP"),
            Protocol::Cms => write!(f, "S/MIME"),
            Protocol::Spawn => write!(f, "spawn"),
        }
    }
}
