//! # Account Identifiers
//!
//! Accounts are the principals of the protocol: attestors, claimants and
//! claim creators. An account is rendered as [`ACCOUNT_PREFIX`] followed by a
//! 20-character suffix grouped `XXXX-XXXX-XXXX-XXXXX`, each `X` drawn from
//! [`ACCOUNT_ALPHABET`].
//!
//! Records only store the suffix (the redirect field); the prefix is added
//! back when a redirect is followed. The suffix sentinel [`NO_REDIRECT`]
//! contains `0`, which is not in the alphabet, so it can never collide with a
//! real account.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, ProtocolError};

/// Prefix prepended to every account suffix.
pub const ACCOUNT_PREFIX: &str = "APX-";

/// Symbols permitted in an account suffix (no `0`, `1`, `I`, `O`).
pub const ACCOUNT_ALPHABET: &[u8; 32] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Length of an account suffix including its dashes.
pub const ACCOUNT_SUFFIX_LENGTH: usize = 20;

/// Redirect-field sentinel meaning "this record is not redirected".
pub const NO_REDIRECT: &str = "0000-0000-0000-00000";

/// Positions of the group separators inside a suffix.
const DASH_POSITIONS: [usize; 3] = [4, 9, 14];

/// Number of alphabet symbols in a suffix.
const SUFFIX_SYMBOLS: usize = 17;

/// Whether `suffix` is a syntactically valid account suffix.
///
/// The sentinel [`NO_REDIRECT`] is *not* a valid suffix.
pub fn is_valid_suffix(suffix: &str) -> bool {
    let bytes = suffix.as_bytes();
    if bytes.len() != ACCOUNT_SUFFIX_LENGTH {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| {
        if DASH_POSITIONS.contains(&i) {
            *b == b'-'
        } else {
            ACCOUNT_ALPHABET.contains(b)
        }
    })
}

/// A validated account identifier, e.g. `APX-7XQK-2MNB-ZT4P-9HJRC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Parse a full account identifier.
    ///
    /// Input is trimmed and upper-cased before validation.
    ///
    /// # Errors
    ///
    /// `INVALID_ACCOUNT` if the prefix is missing or the suffix is malformed.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ProtocolError> {
        let normalized = value.as_ref().trim().to_uppercase();
        match normalized.strip_prefix(ACCOUNT_PREFIX) {
            Some(suffix) if is_valid_suffix(suffix) => Ok(Self(normalized)),
            _ => Err(ProtocolError::new(
                ErrorCode::InvalidAccount,
                format!(
                    "invalid account {:?} (expected {ACCOUNT_PREFIX}XXXX-XXXX-XXXX-XXXXX)",
                    value.as_ref()
                ),
            )),
        }
    }

    /// Build an account from a bare suffix, as stored in a redirect field.
    ///
    /// # Errors
    ///
    /// `INVALID_ACCOUNT` if the suffix is malformed (including the sentinel).
    pub fn from_suffix(suffix: &str) -> Result<Self, ProtocolError> {
        Self::new(format!("{ACCOUNT_PREFIX}{suffix}"))
    }

    /// Render a numeric account id in the alphabet.
    ///
    /// The number is written big-endian in base 32 over 17 symbols, which
    /// covers the whole `u64` range.
    pub fn from_numeric(mut id: u64) -> Self {
        let mut symbols = [ACCOUNT_ALPHABET[0]; SUFFIX_SYMBOLS];
        for slot in symbols.iter_mut().rev() {
            *slot = ACCOUNT_ALPHABET[(id % 32) as usize];
            id /= 32;
        }
        let mut out = String::with_capacity(ACCOUNT_PREFIX.len() + ACCOUNT_SUFFIX_LENGTH);
        out.push_str(ACCOUNT_PREFIX);
        for (i, symbol) in symbols.iter().enumerate() {
            if matches!(i, 4 | 8 | 12) {
                out.push('-');
            }
            out.push(*symbol as char);
        }
        Self(out)
    }

    /// The full identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 20-character suffix, as written into redirect fields.
    pub fn suffix(&self) -> &str {
        &self.0[ACCOUNT_PREFIX.len()..]
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for AccountId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}
