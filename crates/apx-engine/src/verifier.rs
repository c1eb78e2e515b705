//! # Trust-Chain Verification
//!
//! Checks a [`SignedClaim`]'s signature, then walks its trust path from the
//! creator to a root, following deprecation redirects at every position.
//!
//! ## Positional Rules
//!
//! | Position | LEAF | INTERMEDIATE | ROOT | DEPRECATED |
//! |----------|------|--------------|------|------------|
//! | BEGIN    | yes  | yes          | only if also END | rejected |
//! | ONGOING  | no   | yes          | no   | followed |
//! | END      | no   | no           | yes  | followed |
//!
//! INACTIVE records are rejected everywhere. The first entity type seen at a
//! position fixes the type for every redirect hop at that position.
//!
//! ## Result
//!
//! The verified chain lists every account visited, redirect targets
//! included. The active root is its last entry, which differs from the
//! trusted root when the trusted root was itself deprecated.

use std::sync::Arc;

use apx_core::{AccountId, EntityState, EntityType, ErrorCode, ProtocolError, MAX_DEPRECATION_HOPS};
use apx_crypto::TokenService;
use apx_ledger::LedgerStore;
use serde::{Deserialize, Serialize};

use crate::checks::VerifyOptions;
use crate::claim::SignedClaim;
use crate::reader::{fetch_record, AttestationEntity};

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Last account visited; the trusted root or its redirect successor.
    pub active_root_account: AccountId,
    /// Every account visited, redirect targets included.
    pub verified_trust_chain: Vec<AccountId>,
}

/// Where an account sits in the trust path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    /// The creator, with more accounts above it.
    Begin,
    /// Between the creator and the root.
    Ongoing,
    /// The root end of the path.
    End,
    /// A path of one account, both BEGIN and END.
    Sole,
}

impl ChainPosition {
    /// Position of `index` in a path of `len` accounts.
    pub fn of(index: usize, len: usize) -> Self {
        let last = len.saturating_sub(1);
        match (index == 0, index == last) {
            (true, true) => Self::Sole,
            (true, false) => Self::Begin,
            (false, true) => Self::End,
            (false, false) => Self::Ongoing,
        }
    }

    /// True for the creator's position.
    pub fn is_begin(self) -> bool {
        matches!(self, Self::Begin | Self::Sole)
    }

    /// True where the record must be a self-attested root.
    pub fn is_end(self) -> bool {
        matches!(self, Self::End | Self::Sole)
    }
}

/// Walk state for one position of the trust path.
#[derive(Debug)]
struct PositionWalk {
    position: ChainPosition,
    claimant: AccountId,
    attestor: AccountId,
    hops: usize,
    expected_type: Option<EntityType>,
}

impl PositionWalk {
    fn new(path: &[AccountId], index: usize) -> Self {
        let position = ChainPosition::of(index, path.len());
        let claimant = path[index].clone();
        let attestor = if position.is_end() {
            claimant.clone()
        } else {
            path[index + 1].clone()
        };
        Self {
            position,
            claimant,
            attestor,
            hops: 0,
            expected_type: None,
        }
    }

    /// Enforce type consistency and positional rules for one fetched record.
    fn check(&mut self, entity_type: EntityType, state: EntityState) -> Result<(), ProtocolError> {
        match self.expected_type {
            Some(expected) if expected != entity_type => {
                return Err(ProtocolError::new(
                    ErrorCode::EntityMismatch,
                    format!(
                        "{} is {entity_type} but its deprecation chain started as {expected}",
                        self.claimant
                    ),
                ));
            }
            Some(_) => {}
            None => self.expected_type = Some(entity_type),
        }

        match entity_type {
            EntityType::Leaf if !self.position.is_begin() => {
                return Err(ProtocolError::new(
                    ErrorCode::LeafAttestorNotAllowed,
                    format!("leaf {} cannot attest for others", self.claimant),
                ));
            }
            EntityType::Root if !self.position.is_end() => {
                return Err(ProtocolError::new(
                    ErrorCode::RootEntityInMiddleOfPath,
                    format!("root {} is not at the end of the path", self.claimant),
                ));
            }
            EntityType::Leaf | EntityType::Intermediate if self.position.is_end() => {
                return Err(ProtocolError::new(
                    ErrorCode::EndEntityNotRoot,
                    format!("path ends at {entity_type} {}", self.claimant),
                ));
            }
            _ => {}
        }

        match state {
            EntityState::Inactive => Err(ProtocolError::new(
                ErrorCode::EntityInactive,
                format!("{} is INACTIVE", self.claimant),
            )),
            EntityState::Deprecated if self.position.is_begin() => Err(ProtocolError::new(
                ErrorCode::CreatorAccountDeprecated,
                format!("creator {} is deprecated", self.claimant),
            )),
            _ => Ok(()),
        }
    }

    /// Move to the redirect target of a deprecated record.
    fn follow(&mut self, redirect: Option<AccountId>) -> Result<(), ProtocolError> {
        let next = redirect.ok_or_else(|| {
            ProtocolError::new(
                ErrorCode::InvalidRedirectAccount,
                format!("{} is deprecated without a redirect account", self.claimant),
            )
        })?;
        if self.hops >= MAX_DEPRECATION_HOPS {
            return Err(ProtocolError::new(
                ErrorCode::TooManyDeprecationHops,
                format!(
                    "more than {MAX_DEPRECATION_HOPS} redirects following {}",
                    self.claimant
                ),
            ));
        }
        self.hops += 1;
        if self.position.is_end() {
            self.attestor = next.clone();
        }
        self.claimant = next;
        Ok(())
    }
}

/// Verifies signed claims against the ledger.
#[derive(Clone)]
pub struct TrustChainVerifier {
    ledger: Arc<dyn LedgerStore>,
    tokens: Arc<dyn TokenService>,
}

impl TrustChainVerifier {
    pub fn new(ledger: Arc<dyn LedgerStore>, tokens: Arc<dyn TokenService>) -> Self {
        Self { ledger, tokens }
    }

    /// Verify `claim` and prove it chains up to `trusted_root`.
    pub async fn verify(
        &self,
        claim: &SignedClaim,
        trusted_root: &AccountId,
        options: &VerifyOptions,
    ) -> Result<VerificationResult, ProtocolError> {
        self.check_signature(claim, options).await?;

        let path = claim.trust_path();
        let context = &claim.attestation_context;
        let mut chain = Vec::with_capacity(path.len());
        let mut root_found = false;

        for index in 0..path.len() {
            let mut walk = PositionWalk::new(&path, index);
            loop {
                let record =
                    fetch_record(self.ledger.as_ref(), &walk.claimant, &walk.attestor, context)
                        .await?;
                tracing::debug!(
                    claimant = %walk.claimant,
                    attestor = %walk.attestor,
                    entity_type = %record.entity_type,
                    state = %record.state,
                    hop = walk.hops,
                    "chain hop"
                );
                walk.check(record.entity_type, record.state)?;

                chain.push(walk.claimant.clone());
                if walk.position.is_end() && walk.claimant == *trusted_root {
                    root_found = true;
                }

                let deprecated = record.state == EntityState::Deprecated;
                let redirect = record.redirect_account.clone();
                let entity = AttestationEntity::from_record(
                    walk.claimant.clone(),
                    walk.attestor.clone(),
                    context.clone(),
                    record,
                );
                options.entity_check.check(&entity).map_err(|rejection| {
                    ProtocolError::new(ErrorCode::EntityCheckRejected, rejection.reason)
                })?;

                if !deprecated {
                    break;
                }
                walk.follow(redirect)?;
            }
        }

        if !root_found {
            return Err(ProtocolError::new(
                ErrorCode::TrustedRootNotFound,
                format!("chain does not end at trusted root {trusted_root}"),
            ));
        }

        let active_root_account = chain.last().cloned().ok_or_else(|| {
            ProtocolError::new(ErrorCode::TrustedRootNotFound, "empty trust chain")
        })?;
        tracing::debug!(
            %active_root_account,
            chain_length = chain.len(),
            "trust chain verified"
        );
        Ok(VerificationResult {
            active_root_account,
            verified_trust_chain: chain,
        })
    }

    async fn check_signature(
        &self,
        claim: &SignedClaim,
        options: &VerifyOptions,
    ) -> Result<(), ProtocolError> {
        let decoded = self
            .tokens
            .decode_token(&claim.token_data(), &claim.signature)
            .await?;
        if !decoded.valid {
            return Err(ProtocolError::new(
                ErrorCode::InvalidSignature,
                "signature does not cover the claim",
            ));
        }
        if decoded.signer != claim.creator_account {
            return Err(ProtocolError::new(
                ErrorCode::WrongCreatorAccount,
                format!(
                    "claim names creator {} but was signed by {}",
                    claim.creator_account, decoded.signer
                ),
            ));
        }
        options
            .claim_check
            .check(claim, decoded.timestamp)
            .map_err(|rejection| ProtocolError::new(ErrorCode::ClaimCheckRejected, rejection.reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_of_a_three_account_path() {
        assert_eq!(ChainPosition::of(0, 3), ChainPosition::Begin);
        assert_eq!(ChainPosition::of(1, 3), ChainPosition::Ongoing);
        assert_eq!(ChainPosition::of(2, 3), ChainPosition::End);
    }

    #[test]
    fn single_account_path_is_begin_and_end() {
        let position = ChainPosition::of(0, 1);
        assert!(position.is_begin());
        assert!(position.is_end());
    }

    #[test]
    fn end_position_self_attests() {
        let path = vec![AccountId::from_numeric(1), AccountId::from_numeric(2)];
        let creator = PositionWalk::new(&path, 0);
        assert_eq!(creator.attestor, path[1]);
        let root = PositionWalk::new(&path, 1);
        assert_eq!(root.attestor, path[1]);
    }

    #[test]
    fn redirect_at_end_moves_attestor_too() {
        let path = vec![AccountId::from_numeric(1), AccountId::from_numeric(2)];
        let next = AccountId::from_numeric(3);

        let mut root = PositionWalk::new(&path, 1);
        root.follow(Some(next.clone())).unwrap();
        assert_eq!(root.claimant, next);
        assert_eq!(root.attestor, next);

        let mut middle = PositionWalk::new(&path, 0);
        middle.follow(Some(next.clone())).unwrap();
        assert_eq!(middle.claimant, next);
        assert_eq!(middle.attestor, path[1]);
    }

    #[test]
    fn deprecated_without_redirect_is_invalid_redirect_account() {
        let path = vec![AccountId::from_numeric(1)];
        let err = PositionWalk::new(&path, 0).follow(None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRedirectAccount);
    }

    #[test]
    fn mismatch_is_checked_before_positional_rules() {
        let path = vec![AccountId::from_numeric(1), AccountId::from_numeric(2)];
        let mut root = PositionWalk::new(&path, 1);
        root.check(EntityType::Root, EntityState::Deprecated).unwrap();
        let err = root
            .check(EntityType::Intermediate, EntityState::Active)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EntityMismatch);
    }
}
