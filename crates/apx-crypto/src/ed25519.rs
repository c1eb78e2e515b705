//! # Ed25519 Identity and Token Provider
//!
//! A self-contained implementation of both [`IdentityProvider`] and
//! [`TokenService`], used by tests, the CLI, and any deployment whose ledger
//! accepts Ed25519-signed requests.
//!
//! ## Key Derivation
//!
//! - signing key seed = SHA-256(secret)
//! - account = first 8 bytes of SHA-256(public key), little-endian, rendered
//!   with [`AccountId::from_numeric`]
//!
//! ## Token Layout
//!
//! A token is 200 lowercase hex characters encoding 100 bytes:
//!
//! ```text
//! public_key (32) ‖ unix_seconds (4, big-endian) ‖ signature (64)
//! ```
//!
//! The signature covers `data ‖ public_key ‖ unix_seconds`, so the timestamp
//! cannot be altered without invalidating the token.
//!
//! ## Security Invariant
//!
//! Private keys are never serialized or logged. `Ed25519KeyPair` does not
//! implement `Serialize` and its `Debug` output is opaque.

use apx_core::{AccountId, ErrorCode, ProtocolError, TransportError};
use chrono::{DateTime, TimeZone, Utc};
use ed25519_dalek::{Signer, Verifier};
use sha2::{Digest, Sha256};

use crate::provider::{DecodedToken, IdentityProvider, TokenService};

const PUBLIC_KEY_LEN: usize = 32;
const TIMESTAMP_LEN: usize = 4;
const SIGNATURE_LEN: usize = 64;

/// Total decoded token length in bytes.
pub const TOKEN_BYTES: usize = PUBLIC_KEY_LEN + TIMESTAMP_LEN + SIGNATURE_LEN;

/// An Ed25519 key pair derived from a secret passphrase.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl Ed25519KeyPair {
    /// Derive the key pair controlled by `secret`.
    pub fn from_secret(secret: &str) -> Self {
        let seed: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&seed),
        }
    }

    /// Raw 32-byte public key.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The account addressed by this key pair.
    pub fn account(&self) -> AccountId {
        account_for_public_key(&self.public_key())
    }

    /// Issue a token over `data` stamped with `at`.
    ///
    /// Timestamps before the Unix epoch or after 2106 are clamped into the
    /// 32-bit range.
    pub fn token_at(&self, data: &str, at: DateTime<Utc>) -> String {
        let seconds = u32::try_from(at.timestamp().max(0)).unwrap_or(u32::MAX);
        let public_key = self.public_key();
        let message = signed_message(data, &public_key, seconds);
        let signature = self.signing_key.sign(&message);

        let mut token = Vec::with_capacity(TOKEN_BYTES);
        token.extend_from_slice(&public_key);
        token.extend_from_slice(&seconds.to_be_bytes());
        token.extend_from_slice(&signature.to_bytes());
        to_hex(&token)
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>)")
    }
}

/// The account addressed by a raw public key.
pub fn account_for_public_key(public_key: &[u8; PUBLIC_KEY_LEN]) -> AccountId {
    let digest = Sha256::digest(public_key);
    let mut id = [0u8; 8];
    id.copy_from_slice(&digest[..8]);
    AccountId::from_numeric(u64::from_le_bytes(id))
}

fn signed_message(data: &str, public_key: &[u8; PUBLIC_KEY_LEN], seconds: u32) -> Vec<u8> {
    let mut message = Vec::with_capacity(data.len() + PUBLIC_KEY_LEN + TIMESTAMP_LEN);
    message.extend_from_slice(data.as_bytes());
    message.extend_from_slice(public_key);
    message.extend_from_slice(&seconds.to_be_bytes());
    message
}

/// Parse and check a token against `data` without any I/O.
///
/// # Errors
///
/// `INVALID_SIGNATURE` if the token is not 200 hex characters, carries an
/// invalid public key, or has an unrepresentable timestamp.
pub fn decode_token(data: &str, token: &str) -> Result<DecodedToken, ProtocolError> {
    let malformed = |reason: String| ProtocolError::new(ErrorCode::InvalidSignature, reason);

    let bytes = hex_to_bytes(token.trim()).map_err(malformed)?;
    if bytes.len() != TOKEN_BYTES {
        return Err(malformed(format!(
            "token must be {} hex characters, got {}",
            TOKEN_BYTES * 2,
            token.trim().len()
        )));
    }

    let mut public_key = [0u8; PUBLIC_KEY_LEN];
    public_key.copy_from_slice(&bytes[..PUBLIC_KEY_LEN]);
    let mut seconds = [0u8; TIMESTAMP_LEN];
    seconds.copy_from_slice(&bytes[PUBLIC_KEY_LEN..PUBLIC_KEY_LEN + TIMESTAMP_LEN]);
    let seconds = u32::from_be_bytes(seconds);
    let mut signature = [0u8; SIGNATURE_LEN];
    signature.copy_from_slice(&bytes[PUBLIC_KEY_LEN + TIMESTAMP_LEN..]);

    let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&public_key)
        .map_err(|e| malformed(format!("invalid public key in token: {e}")))?;
    let timestamp = Utc
        .timestamp_opt(i64::from(seconds), 0)
        .single()
        .ok_or_else(|| malformed(format!("invalid token timestamp {seconds}")))?;

    let message = signed_message(data, &public_key, seconds);
    let signature = ed25519_dalek::Signature::from_bytes(&signature);
    let valid = verifying_key.verify(&message, &signature).is_ok();

    Ok(DecodedToken {
        valid,
        signer: account_for_public_key(&public_key),
        timestamp,
    })
}

/// [`IdentityProvider`] and [`TokenService`] backed by local Ed25519 keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Provider;

impl Ed25519Provider {
    /// Create a provider.
    pub fn new() -> Self {
        Self
    }

    /// Sign `data` with `secret`, stamping the token with `at` instead of
    /// the current time.
    pub fn sign_token_at(&self, data: &str, secret: &str, at: DateTime<Utc>) -> String {
        Ed25519KeyPair::from_secret(secret).token_at(data, at)
    }
}

impl IdentityProvider for Ed25519Provider {
    fn derive_account(&self, secret: &str) -> AccountId {
        Ed25519KeyPair::from_secret(secret).account()
    }

    fn sign_token(&self, data: &str, secret: &str) -> String {
        self.sign_token_at(data, secret, Utc::now())
    }
}

#[async_trait::async_trait]
impl TokenService for Ed25519Provider {
    async fn decode_token(&self, data: &str, token: &str) -> Result<DecodedToken, TransportError> {
        decode_token(data, token).map_err(TransportError::from)
    }
}

// ---------------------------------------------------------------------------
// Hex utilities (no external hex crate dependency)
// ---------------------------------------------------------------------------

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err("hex string must have even length".to_string());
    }
    if !hex.is_ascii() {
        return Err("hex string must be ASCII".to_string());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| format!("invalid hex at position {i}: {e}"))
        })
        .collect()
}
