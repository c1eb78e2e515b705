//! Signed claims.
//!
//! A claim is issued once by its creator and verified any number of times.
//! The signature covers the canonical token data: the attestation path
//! accounts concatenated without separators, then the normalized context,
//! then the payload.

use apx_core::{AccountId, AttestationContext};
use apx_crypto::{Identity, IdentityProvider};
use serde::{Deserialize, Serialize};

/// An immutable, signed statement by `creator_account`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedClaim {
    pub creator_account: AccountId,
    pub payload: String,
    pub attestation_context: AttestationContext,
    /// Accounts from the creator's attestor upward, excluding the creator.
    /// Empty when the creator is itself the root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attestation_path: Vec<AccountId>,
    pub signature: String,
}

impl SignedClaim {
    /// Build and sign a claim as `creator`.
    pub fn create(
        provider: &dyn IdentityProvider,
        creator: &Identity,
        context: AttestationContext,
        payload: impl Into<String>,
        attestation_path: Vec<AccountId>,
    ) -> Self {
        let payload = payload.into();
        let data = token_data(&attestation_path, &context, &payload);
        let signature = provider.sign_token(&data, creator.secret());
        Self {
            creator_account: creator.account().clone(),
            payload,
            attestation_context: context,
            attestation_path,
            signature,
        }
    }

    /// The data the signature must cover.
    pub fn token_data(&self) -> String {
        token_data(
            &self.attestation_path,
            &self.attestation_context,
            &self.payload,
        )
    }

    /// The chain of accounts to walk, starting at the creator.
    ///
    /// A path that is empty or already starts with the creator reduces to
    /// the creator alone.
    pub fn trust_path(&self) -> Vec<AccountId> {
        match self.attestation_path.first() {
            None => vec![self.creator_account.clone()],
            Some(first) if *first == self.creator_account => vec![self.creator_account.clone()],
            Some(_) => std::iter::once(self.creator_account.clone())
                .chain(self.attestation_path.iter().cloned())
                .collect(),
        }
    }
}

/// Canonical token data for a path, context and payload.
pub fn token_data(path: &[AccountId], context: &AttestationContext, payload: &str) -> String {
    let mut data: String = path.iter().map(AccountId::as_str).collect();
    data.push_str(context.property_name());
    data.push_str(payload);
    data
}
