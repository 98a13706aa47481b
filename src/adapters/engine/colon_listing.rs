//! Parsers for GnuPG's machine-readable key listings.
//!
//! Two formats are handled:
//!
//! - the local key ring listing (`--with-colons --fixed-list-mode`), one
//!   record per line with the record type in field 1;
//! - the key server search listing (`--with-colons --search-keys`), which
//!   uses the shorter HKP machine-readable layout and knows nothing about
//!   subkey capabilities.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::models::key::{Key, Subkey, UserId};
use crate::core::models::keylist_mode::Protocol;

static MAILBOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([^<>\s]+@[^<>\s]+)>\s*$|^\s*([^<>\s]+@[^<>\s]+)\s*$").expect("valid regex")
});

/// Address part of a user id such as `Jane Doe <jane@example.org>`.
pub fn mailbox_of(uid: &str) -> Option<String> {
    let caps = MAILBOX.captures(uid)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_lowercase())
}

/// Parse a local key ring listing.
pub fn parse_keyring_listing(output: &str, protocol: Protocol) -> Vec<Key> {
    let mut keys = Vec::new();
    let mut current: Option<Key> = None;

    for line in output.lines() {
        let fields: Vec<&str> = line.split(':').collect();
        let field = |n: usize| fields.get(n - 1).copied().unwrap_or_default();

        match field(1) {
            "pub" | "sec" | "crt" | "crs" => {
                keys.extend(current.take());
                let primary = parse_subkey(&fields);
                let caps = field(12);
                current = Some(Key {
                    protocol,
                    secret: matches!(field(1), "sec" | "crs"),
                    expired: primary.expired,
                    revoked: primary.revoked,
                    invalid: primary.invalid,
                    disabled: caps.contains('D') || field(2) == "d",
                    subkeys: vec![primary],
                    ..Default::default()
                });
            }
            "sub" | "ssb" => {
                if let Some(key) = current.as_mut() {
                    key.subkeys.push(parse_subkey(&fields));
                }
            }
            "fpr" => {
                if let Some(key) = current.as_mut() {
                    let fpr = field(10).to_string();
                    if let Some(subkey) = key.subkeys.last_mut() {
                        if subkey.fingerprint.is_empty() {
                            subkey.fingerprint = fpr.clone();
                        }
                    }
                    if key.fingerprint.is_empty() {
                        key.fingerprint = fpr;
                    }
                }
            }
            "uid" => {
                if let Some(key) = current.as_mut() {
                    let uid = unescape_colons(field(10));
                    key.user_ids.push(UserId {
                        mailbox: mailbox_of(&uid),
                        revoked: field(2) == "r",
                        invalid: field(2) == "i",
                        uid,
                    });
                }
            }
            _ => {}
        }
    }
    keys.extend(current);
    keys
}

fn parse_subkey(fields: &[&str]) -> Subkey {
    let field = |n: usize| fields.get(n - 1).copied().unwrap_or_default();
    let validity = field(2);
    let caps = field(12);
    Subkey {
        key_id: field(5).to_string(),
        can_sign: caps.contains('s'),
        can_encrypt: caps.contains('e'),
        can_certify: caps.contains('c'),
        can_authenticate: caps.contains('a'),
        expired: validity == "e",
        revoked: validity == "r",
        invalid: validity == "i",
        disabled: validity == "d",
        algorithm: field(4).parse().unwrap_or_default(),
        length: field(3).parse().unwrap_or_default(),
        created: parse_timestamp(field(6)),
        expires: parse_timestamp(field(7)),
        ..Default::default()
    }
}

/// Parse a key server search listing.
///
/// Each key gets a single primary subkey whose fingerprint is whatever the
/// server reported (a full fingerprint on current servers, a key id on
/// old ones).
pub fn parse_search_listing(output: &str) -> Vec<Key> {
    let mut keys = Vec::new();
    let mut current: Option<Key> = None;

    for line in output.lines() {
        let fields: Vec<&str> = line.split(':').collect();
        let field = |n: usize| fields.get(n - 1).copied().unwrap_or_default();

        match field(1) {
            "pub" => {
                keys.extend(current.take());
                let id = field(2).to_uppercase();
                let flags = field(7);
                let expires = parse_timestamp(field(6));
                let primary = Subkey {
                    key_id: id.get(id.len().saturating_sub(16)..).unwrap_or(&id).to_string(),
                    fingerprint: id.clone(),
                    algorithm: field(3).parse().unwrap_or_default(),
                    length: field(4).parse().unwrap_or_default(),
                    created: parse_timestamp(field(5)),
                    expires,
                    revoked: flags.contains('r'),
                    disabled: flags.contains('d'),
                    expired: flags.contains('e'),
                    ..Default::default()
                };
                current = Some(Key {
                    fingerprint: id,
                    protocol: Protocol::OpenPgp,
                    remote: true,
                    revoked: primary.revoked,
                    disabled: primary.disabled,
                    expired: primary.expired,
                    subkeys: vec![primary],
                    ..Default::default()
                });
            }
            "uid" => {
                if let Some(key) = current.as_mut() {
                    let uid = unescape_percent(field(2));
                    let flags = field(5);
                    key.user_ids.push(UserId {
                        mailbox: mailbox_of(&uid),
                        revoked: flags.contains('r'),
                        invalid: false,
                        uid,
                    });
                }
            }
            _ => {}
        }
    }
    keys.extend(current);
    keys
}

/// Seconds since the epoch; empty or unparsable fields mean "none" (0).
fn parse_timestamp(field: &str) -> i64 {
    if let Ok(secs) = field.parse::<i64>() {
        return secs;
    }
    chrono::NaiveDateTime::parse_from_str(field, "%Y%m%dT%H%M%S")
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Undo the `\xHH` escaping GnuPG applies to user ids in colon listings.
fn unescape_colons(raw: &str) -> String {
    unescape(raw, "\\x")
}

/// Undo the `%HH` escaping of key server listings.
fn unescape_percent(raw: &str) -> String {
    unescape(raw, "%")
}

fn unescape(raw: &str, marker: &str) -> String {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find(marker) {
        bytes.extend_from_slice(&rest.as_bytes()[..pos]);
        let after = &rest[pos + marker.len()..];
        match after.get(..2).and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
            Some(byte) => {
                bytes.push(byte);
                rest = &after[2..];
            }
            None => {
                bytes.extend_from_slice(marker.as_bytes());
                rest = after;
            }
        }
    }
    bytes.extend_from_slice(rest.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}
