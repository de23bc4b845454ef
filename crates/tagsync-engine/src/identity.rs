//! Canonical tag identity derivation.
//!
//! A tag name is the prefix followed by the sanitized PLC address. Word
//! characters pass through, the address separators `: . [ ]` become `_`,
//! and anything else is spelled as `_XX_` with the uppercase hex code point.
//! Runs of `_` collapse and the result is trimmed of `_` on both ends.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Who owns the tag name of an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameMode {
    /// Name follows prefix and address edits.
    #[default]
    Derived,
    /// Name was set by hand and is left untouched.
    Manual,
}

impl NameMode {
    /// Whether edits leave the name untouched.
    #[must_use]
    pub fn is_manual(self) -> bool {
        matches!(self, Self::Manual)
    }
}

/// Sanitizes a raw PLC address into identity-safe characters.
#[must_use]
pub fn sanitize_address(address: &str) -> String {
    let mut raw = String::with_capacity(address.len());
    for ch in address.chars() {
        match ch {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '_' => raw.push(ch),
            ':' | '.' | '[' | ']' => raw.push('_'),
            other => {
                let _ = write!(raw, "_{:02X}_", u32::from(other));
            }
        }
    }

    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }
    out.trim_matches('_').to_string()
}

/// Derives the canonical identity `prefix + sanitize_address(address)`.
#[must_use]
pub fn derive_identity(prefix: &str, address: &str) -> String {
    let mut identity = String::with_capacity(prefix.len() + address.len());
    identity.push_str(prefix);
    identity.push_str(&sanitize_address(address));
    identity
}

/// Best-effort recovery of the prefix from an existing `(name, address)` pair.
///
/// Returns `None` when the name does not end with the sanitized address.
/// Ambiguous layouts (the address sanitizing to a substring that occurs
/// more than once) resolve to the shortest suffix match.
#[must_use]
pub fn infer_prefix(name: &str, address: &str) -> Option<String> {
    let sanitized = sanitize_address(address);
    if sanitized.is_empty() || name.len() < sanitized.len() {
        return None;
    }
    let split = name.len() - sanitized.len();
    if !name.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = name.split_at(split);
    if !tail.eq_ignore_ascii_case(&sanitized) {
        return None;
    }
    Some(head.trim_end_matches('_').to_string())
}
