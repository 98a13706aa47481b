use crate::core::models::key::{Key, Subkey};

/// Decides whether a key can be used for a lookup.
pub struct KeyValidator;

impl KeyValidator {
    /// Check whether a key can be used.
    ///
    /// A key is usable when it is neither expired, revoked, disabled nor invalid
    /// and at least one of its subkeys is valid at `now` (seconds since the
    /// epoch, UTC) and has the required capability: signing for secret keys,
    /// encryption for public keys.
    ///
    /// Key servers report far less about subkeys than the local key ring, so
    /// for `remote` keys the capability check is skipped.
    pub fn is_usable(key: &Key, want_secret: bool, remote: bool, now: i64) -> bool {
        if key.expired || key.revoked || key.disabled || key.invalid {
            return false;
        }
        key.subkeys
            .iter()
            .any(|subkey| subkey_usable(subkey, want_secret, remote, now))
    }
}

fn subkey_usable(subkey: &Subkey, want_secret: bool, remote: bool, now: i64) -> bool {
    let capable = remote
        || (want_secret && subkey.can_sign)
        || (!want_secret && subkey.can_encrypt);
    let valid = !(subkey.expired || subkey.revoked || subkey.disabled || subkey.invalid);
    let current = subkey.expires == 0 || subkey.expires > now;
    capable && valid && current
}
