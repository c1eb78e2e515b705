//! # Identity and Token Seams
//!
//! The protocol treats account derivation, signing and token verification as
//! black boxes. These traits are the seams: the engine only ever talks to
//! `dyn IdentityProvider` and `dyn TokenService`, so a ledger-native signer
//! and the bundled [`Ed25519Provider`](crate::Ed25519Provider) are
//! interchangeable.

use apx_core::{AccountId, TransportError};
use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

/// Derives accounts from secrets and signs token data.
pub trait IdentityProvider: Send + Sync {
    /// The account controlled by `secret`.
    fn derive_account(&self, secret: &str) -> AccountId;

    /// Produce a bearer token over `data`, signed with `secret`.
    fn sign_token(&self, data: &str, secret: &str) -> String;
}

/// Outcome of decoding a token against the data it claims to cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    /// Whether the token's signature covers the supplied data.
    pub valid: bool,
    /// Account that produced the token.
    pub signer: AccountId,
    /// When the token was produced.
    pub timestamp: DateTime<Utc>,
}

/// Verifies bearer tokens.
#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    /// Decode `token` against `data`.
    ///
    /// A well-formed token whose signature does not cover `data` yields
    /// `valid == false`. A token that cannot be parsed at all is an error.
    async fn decode_token(&self, data: &str, token: &str) -> Result<DecodedToken, TransportError>;
}

/// A signing identity: an account together with the secret controlling it.
///
/// `Debug` never prints the secret.
#[derive(Clone)]
pub struct Identity {
    account: AccountId,
    secret: Zeroizing<String>,
}

impl Identity {
    /// Build an identity, deriving its account through `provider`.
    pub fn new(provider: &dyn IdentityProvider, secret: impl Into<String>) -> Self {
        let secret = Zeroizing::new(secret.into());
        Self {
            account: provider.derive_account(&secret),
            secret,
        }
    }

    /// The account this identity controls.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// The secret, for handing to an [`IdentityProvider`].
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("account", &self.account)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
