//! # apx-engine: Attestation Lifecycle and Trust-Chain Verification
//!
//! The protocol engine, written against the [`LedgerStore`] and
//! [`TokenService`] seams:
//!
//! - **Lifecycle** (`lifecycle.rs`): [`AttestationLifecycle`] creates,
//!   updates and revokes records, including the two-record deprecation
//!   redirect.
//! - **Verification** (`verifier.rs`): [`TrustChainVerifier`] checks a
//!   [`SignedClaim`] and walks its trust path to a trusted root.
//! - **Reading** (`reader.rs`): [`EntityReader`] for single-record lookups.
//! - **Claims** (`claim.rs`) and **checks** (`checks.rs`): the signed
//!   artifact and the caller-supplied acceptance callbacks.
//!
//! Every operation returns a [`ProtocolError`](apx_core::ProtocolError);
//! transport failures are classified on the way out.
//!
//! [`LedgerStore`]: apx_ledger::LedgerStore
//! [`TokenService`]: apx_crypto::TokenService

pub mod checks;
pub mod claim;
pub mod lifecycle;
pub mod reader;
pub mod verifier;

pub use checks::{AcceptAll, ClaimCheck, EntityCheck, Rejection, VerifyOptions};
pub use claim::SignedClaim;
pub use lifecycle::{
    AttestationLifecycle, Attestor, CreateRequest, RedirectTarget, RevokeRequest, UpdateOutcome,
    UpdateRequest,
};
pub use reader::{AttestationEntity, EntityReader};
pub use verifier::{ChainPosition, TrustChainVerifier, VerificationResult};
