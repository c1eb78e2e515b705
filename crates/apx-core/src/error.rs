//! # Error Taxonomy
//!
//! Every failure the protocol can report is a [`ProtocolError`]: a closed
//! [`ErrorCode`] plus a human-readable description. Library consumers branch
//! on the code; the description is for operators.
//!
//! ## Groups
//!
//! Codes fall into four groups (see [`ErrorGroup`]):
//!
//! - **Transport**: the ledger or token service could not be reached, or
//!   rejected the request.
//! - **Codec**: a stored record or identifier is malformed.
//! - **Lifecycle**: a create/update/revoke request violates the hierarchy
//!   or the per-record state machine.
//! - **Chain**: a trust-chain walk found a claim or record that cannot be
//!   part of a valid chain.
//!
//! ## Classification
//!
//! Transport adapters return [`TransportError`]. The `From` conversion into
//! [`ProtocolError`] is the single classification point: connectivity
//! failures become `CONNECTION_ERROR`, remote rejections become `NODE_ERROR`
//! carrying the remote description, and errors that are already
//! protocol-shaped pass through unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The coarse family an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorGroup {
    /// Network or remote-node failures.
    Transport,
    /// Malformed records or identifiers.
    Codec,
    /// Create/update/revoke rule violations.
    Lifecycle,
    /// Trust-chain verification failures.
    Chain,
}

/// Machine-readable error code.
///
/// Serialized and displayed in `SCREAMING_SNAKE_CASE`, which is the stable
/// external name of each code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ── transport ──
    /// The remote service could not be reached.
    ConnectionError,
    /// The remote service rejected the request.
    NodeError,

    // ── codec ──
    /// Fewer delimiter-separated fields than the record format requires.
    WrongNumberOfDataFields,
    /// Version field is not exactly 3 characters.
    WrongVersionLength,
    /// Version field is not the supported protocol version.
    UnknownVersion,
    /// Entity type field is not exactly 1 character.
    WrongEntityTypeLength,
    /// Entity type field is not a known entity code.
    UnknownEntityType,
    /// State field is not exactly 1 character.
    WrongStateTypeLength,
    /// State field is not a known state code.
    UnknownStateType,
    /// Redirect account field is not exactly 20 characters.
    WrongRedirectAccountLength,
    /// Redirect account is neither the sentinel nor a valid account suffix.
    InvalidRedirectAccount,
    /// Payload exceeds the maximum length.
    PayloadTooLong,
    /// An account identifier is malformed.
    InvalidAccount,

    // ── lifecycle ──
    /// No attestation exists for the requested (owner, setter, context).
    AttestationContextNotFound,
    /// An attestation already exists where a new one would be written.
    AttestationContextAlreadySet,
    /// The entity is not in the ACTIVE state.
    EntityNotActive,
    /// The requested state equals the current state.
    StateAlreadySet,
    /// The requested payload equals the current payload.
    PayloadAlreadySet,
    /// DEPRECATED can only be reached through a redirect.
    DeprecateStateCannotBeSet,
    /// The attestor's entity type may not attest the requested entity type.
    AttestationNotAllowed,
    /// A non-root entity tried to attest itself.
    SelfAttestationNotAllowed,
    /// The stored entity type differs from the expected one.
    EntityMismatch,
    /// An update request changes nothing.
    NothingToUpdate,
    /// A redirect was combined with an explicit state change.
    RedirectWithStateChange,
    /// The redirect destination does not fit the entity type.
    InvalidRedirectTarget,

    // ── chain ──
    /// A LEAF record appeared where an attestor is required.
    LeafAttestorNotAllowed,
    /// The last entity of the chain is not a ROOT.
    EndEntityNotRoot,
    /// A ROOT record appeared before the end of the chain.
    RootEntityInMiddleOfPath,
    /// The claim signature does not verify.
    InvalidSignature,
    /// The claim was signed by an account other than its creator.
    WrongCreatorAccount,
    /// The claim creator's record is deprecated.
    CreatorAccountDeprecated,
    /// A deprecation redirect chain is longer than allowed.
    TooManyDeprecationHops,
    /// An entity on the chain is INACTIVE.
    EntityInactive,
    /// The trusted root was never reached.
    TrustedRootNotFound,
    /// The caller's claim check rejected the claim.
    ClaimCheckRejected,
    /// The caller's entity check rejected an entity on the chain.
    EntityCheckRejected,
}

impl ErrorCode {
    /// The group this code belongs to.
    ///
    /// `ENTITY_MISMATCH` is reported by both the lifecycle engine and the
    /// chain walk; it is grouped with lifecycle.
    pub fn group(&self) -> ErrorGroup {
        match self {
            Self::ConnectionError | Self::NodeError => ErrorGroup::Transport,
            Self::WrongNumberOfDataFields
            | Self::WrongVersionLength
            | Self::UnknownVersion
            | Self::WrongEntityTypeLength
            | Self::UnknownEntityType
            | Self::WrongStateTypeLength
            | Self::UnknownStateType
            | Self::WrongRedirectAccountLength
            | Self::InvalidRedirectAccount
            | Self::PayloadTooLong
            | Self::InvalidAccount => ErrorGroup::Codec,
            Self::AttestationContextNotFound
            | Self::AttestationContextAlreadySet
            | Self::EntityNotActive
            | Self::StateAlreadySet
            | Self::PayloadAlreadySet
            | Self::DeprecateStateCannotBeSet
            | Self::AttestationNotAllowed
            | Self::SelfAttestationNotAllowed
            | Self::EntityMismatch
            | Self::NothingToUpdate
            | Self::RedirectWithStateChange
            | Self::InvalidRedirectTarget => ErrorGroup::Lifecycle,
            Self::LeafAttestorNotAllowed
            | Self::EndEntityNotRoot
            | Self::RootEntityInMiddleOfPath
            | Self::InvalidSignature
            | Self::WrongCreatorAccount
            | Self::CreatorAccountDeprecated
            | Self::TooManyDeprecationHops
            | Self::EntityInactive
            | Self::TrustedRootNotFound
            | Self::ClaimCheckRejected
            | Self::EntityCheckRejected => ErrorGroup::Chain,
        }
    }

    /// The stable external name of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionError => "CONNECTION_ERROR",
            Self::NodeError => "NODE_ERROR",
            Self::WrongNumberOfDataFields => "WRONG_NUMBER_OF_DATA_FIELDS",
            Self::WrongVersionLength => "WRONG_VERSION_LENGTH",
            Self::UnknownVersion => "UNKNOWN_VERSION",
            Self::WrongEntityTypeLength => "WRONG_ENTITY_TYPE_LENGTH",
            Self::UnknownEntityType => "UNKNOWN_ENTITY_TYPE",
            Self::WrongStateTypeLength => "WRONG_STATE_TYPE_LENGTH",
            Self::UnknownStateType => "UNKNOWN_STATE_TYPE",
            Self::WrongRedirectAccountLength => "WRONG_REDIRECT_ACCOUNT_LENGTH",
            Self::InvalidRedirectAccount => "INVALID_REDIRECT_ACCOUNT",
            Self::PayloadTooLong => "PAYLOAD_TOO_LONG",
            Self::InvalidAccount => "INVALID_ACCOUNT",
            Self::AttestationContextNotFound => "ATTESTATION_CONTEXT_NOT_FOUND",
            Self::AttestationContextAlreadySet => "ATTESTATION_CONTEXT_ALREADY_SET",
            Self::EntityNotActive => "ENTITY_NOT_ACTIVE",
            Self::StateAlreadySet => "STATE_ALREADY_SET",
            Self::PayloadAlreadySet => "PAYLOAD_ALREADY_SET",
            Self::DeprecateStateCannotBeSet => "DEPRECATE_STATE_CANNOT_BE_SET",
            Self::AttestationNotAllowed => "ATTESTATION_NOT_ALLOWED",
            Self::SelfAttestationNotAllowed => "SELF_ATTESTATION_NOT_ALLOWED",
            Self::EntityMismatch => "ENTITY_MISMATCH",
            Self::NothingToUpdate => "NOTHING_TO_UPDATE",
            Self::RedirectWithStateChange => "REDIRECT_WITH_STATE_CHANGE",
            Self::InvalidRedirectTarget => "INVALID_REDIRECT_TARGET",
            Self::LeafAttestorNotAllowed => "LEAF_ATTESTOR_NOT_ALLOWED",
            Self::EndEntityNotRoot => "END_ENTITY_NOT_ROOT",
            Self::RootEntityInMiddleOfPath => "ROOT_ENTITY_IN_MIDDLE_OF_PATH",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::WrongCreatorAccount => "WRONG_CREATOR_ACCOUNT",
            Self::CreatorAccountDeprecated => "CREATOR_ACCOUNT_DEPRECATED",
            Self::TooManyDeprecationHops => "TOO_MANY_DEPRECATION_HOPS",
            Self::EntityInactive => "ENTITY_INACTIVE",
            Self::TrustedRootNotFound => "TRUSTED_ROOT_NOT_FOUND",
            Self::ClaimCheckRejected => "CLAIM_CHECK_REJECTED",
            Self::EntityCheckRejected => "ENTITY_CHECK_REJECTED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal, typed protocol failure.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {description}")]
pub struct ProtocolError {
    /// What went wrong, for programmatic branching.
    pub code: ErrorCode,
    /// What went wrong, for humans.
    pub description: String,
}

impl ProtocolError {
    /// Build an error from a code and description.
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    /// The group of this error's code.
    pub fn group(&self) -> ErrorGroup {
        self.code.group()
    }
}

/// Failure reported by a ledger or token-service adapter.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The remote service could not be reached (refused, timed out, DNS).
    #[error("connection to {endpoint} failed: {reason}")]
    Connection {
        /// The endpoint or operation being attempted.
        endpoint: String,
        /// Underlying failure.
        reason: String,
    },

    /// The remote service answered but rejected the request.
    #[error("{endpoint} rejected the request: {description}")]
    Node {
        /// The endpoint or operation being attempted.
        endpoint: String,
        /// The remote's description of the rejection.
        description: String,
    },

    /// The adapter already produced a protocol-level error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<TransportError> for ProtocolError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connection { endpoint, reason } => ProtocolError::new(
                ErrorCode::ConnectionError,
                format!("could not reach {endpoint}: {reason}"),
            ),
            TransportError::Node { description, .. } => {
                ProtocolError::new(ErrorCode::NodeError, description)
            }
            TransportError::Protocol(inner) => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_failure_classifies_as_connection_error() {
        let err: ProtocolError = TransportError::Connection {
            endpoint: "GET /api/v1/properties".into(),
            reason: "connection refused".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::ConnectionError);
        assert!(err.description.contains("connection refused"));
        assert_eq!(err.group(), ErrorGroup::Transport);
    }

    #[test]
    fn node_rejection_carries_remote_description() {
        let err: ProtocolError = TransportError::Node {
            endpoint: "PUT /api/v1/properties".into(),
            description: "not enough funds".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::NodeError);
        assert_eq!(err.description, "not enough funds");
    }

    #[test]
    fn protocol_errors_pass_through_unchanged() {
        let original = ProtocolError::new(ErrorCode::UnknownVersion, "version 002");
        let err: ProtocolError = TransportError::Protocol(original.clone()).into();
        assert_eq!(err, original);
    }

    #[test]
    fn display_leads_with_code() {
        let err = ProtocolError::new(ErrorCode::EntityInactive, "bob is inactive");
        assert_eq!(err.to_string(), "ENTITY_INACTIVE: bob is inactive");
    }

    #[test]
    fn serde_name_matches_display() {
        let json = serde_json::to_string(&ErrorCode::TooManyDeprecationHops).unwrap();
        assert_eq!(json, "\"TOO_MANY_DEPRECATION_HOPS\"");
        assert_eq!(
            ErrorCode::TooManyDeprecationHops.to_string(),
            "TOO_MANY_DEPRECATION_HOPS"
        );
    }

    #[test]
    fn groups_cover_each_family() {
        assert_eq!(ErrorCode::PayloadTooLong.group(), ErrorGroup::Codec);
        assert_eq!(ErrorCode::StateAlreadySet.group(), ErrorGroup::Lifecycle);
        assert_eq!(ErrorCode::EntityMismatch.group(), ErrorGroup::Lifecycle);
        assert_eq!(ErrorCode::TrustedRootNotFound.group(), ErrorGroup::Chain);
    }
}
