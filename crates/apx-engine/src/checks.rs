//! Caller-supplied acceptance checks for chain verification.
//!
//! The verifier consults a [`ClaimCheck`] once, after the signature has been
//! checked, and an [`EntityCheck`] for every record it visits. Both are
//! synchronous and may abort the walk by returning a [`Rejection`]. Closures
//! with the matching signature implement the traits directly.

use chrono::{DateTime, Utc};

use crate::claim::SignedClaim;
use crate::reader::AttestationEntity;

/// A caller's refusal to accept a claim or entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct Rejection {
    pub reason: String,
}

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Decides whether a claim is acceptable given when it was signed.
pub trait ClaimCheck: Send + Sync {
    fn check(&self, claim: &SignedClaim, created_at: DateTime<Utc>) -> Result<(), Rejection>;
}

impl<F> ClaimCheck for F
where
    F: Fn(&SignedClaim, DateTime<Utc>) -> Result<(), Rejection> + Send + Sync,
{
    fn check(&self, claim: &SignedClaim, created_at: DateTime<Utc>) -> Result<(), Rejection> {
        self(claim, created_at)
    }
}

/// Decides whether a visited chain entity is acceptable.
pub trait EntityCheck: Send + Sync {
    fn check(&self, entity: &AttestationEntity) -> Result<(), Rejection>;
}

impl<F> EntityCheck for F
where
    F: Fn(&AttestationEntity) -> Result<(), Rejection> + Send + Sync,
{
    fn check(&self, entity: &AttestationEntity) -> Result<(), Rejection> {
        self(entity)
    }
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ClaimCheck for AcceptAll {
    fn check(&self, _: &SignedClaim, _: DateTime<Utc>) -> Result<(), Rejection> {
        Ok(())
    }
}

impl EntityCheck for AcceptAll {
    fn check(&self, _: &AttestationEntity) -> Result<(), Rejection> {
        Ok(())
    }
}

/// Callbacks applied during [`verify`](crate::TrustChainVerifier::verify).
///
/// Defaults to accepting every claim and every entity.
pub struct VerifyOptions {
    pub(crate) claim_check: Box<dyn ClaimCheck>,
    pub(crate) entity_check: Box<dyn EntityCheck>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            claim_check: Box::new(AcceptAll),
            entity_check: Box::new(AcceptAll),
        }
    }
}

impl std::fmt::Debug for VerifyOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyOptions").finish_non_exhaustive()
    }
}

impl VerifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the claim check.
    pub fn with_claim_check(mut self, check: impl ClaimCheck + 'static) -> Self {
        self.claim_check = Box::new(check);
        self
    }

    /// Replace the entity check.
    pub fn with_entity_check(mut self, check: impl EntityCheck + 'static) -> Self {
        self.entity_check = Box::new(check);
        self
    }
}
