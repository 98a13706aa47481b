use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::keylist_mode::Protocol;

/// Shared handle to a key.
///
/// Listings, loaders and presentation payloads all hold clones of the same
/// key; it is freed when the last handle is dropped. Keys cross from the
/// keyserver worker to the UI thread, hence `Arc`.
pub type KeyRef = Arc<Key>;

/// A public or secret key as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Key {
    /// Fingerprint of the primary key.
    pub fingerprint: String,
    pub protocol: Protocol,
    pub secret: bool,
    /// Listed from a key server rather than the local key ring.
    pub remote: bool,
    pub expired: bool,
    pub revoked: bool,
    pub disabled: bool,
    pub invalid: bool,
    /// Primary key first, then the subkeys in keyring order.
    pub subkeys: Vec<Subkey>,
    pub user_ids: Vec<UserId>,
}

impl Key {
    /// The first user id, which GnuPG lists as the primary one.
    pub fn primary_uid(&self) -> Option<&UserId> {
        self.user_ids.first()
    }
}

/// A primary key or subkey with its own capabilities and validity window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Subkey {
    pub fingerprint: String,
    pub key_id: String,
    pub can_sign: bool,
    pub can_encrypt: bool,
    pub can_certify: bool,
    pub can_authenticate: bool,
    pub expired: bool,
    pub revoked: bool,
    pub disabled: bool,
    pub invalid: bool,
    /// Public key algorithm number (RFC 4880 numbering).
    pub algorithm: u32,
    pub length: u32,
    /// Creation time, seconds since the epoch.
    pub created: i64,
    /// Expiry time, seconds since the epoch; 0 means never.
    pub expires: i64,
}

impl Subkey {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created, 0).filter(|_| self.created > 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires, 0).filter(|_| self.expires > 0)
    }

    /// Capability letters in GnuPG notation, e.g. `SC` or `E`.
    pub fn capabilities(&self) -> String {
        [
            (self.can_sign, 'S'),
            (self.can_certify, 'C'),
            (self.can_encrypt, 'E'),
            (self.can_authenticate, 'A'),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, c)| *c)
        .collect()
    }
}

/// A user id bound to a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserId {
    pub uid: String,
    /// Address part of the uid, lowercased, if it has one.
    pub mailbox: Option<String>,
    pub revoked: bool,
    pub invalid: bool,
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.primary_uid() {
            Some(uid) => write!(f, "{} {}", self.fingerprint, uid.uid),
            None => write!(f, "{}", self.fingerprint),
        }
    }
}
