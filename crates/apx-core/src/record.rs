//! # Attestation Record Codec
//!
//! One attestation is stored as one ledger property value with the layout
//!
//! ```text
//! version|entityType|state|redirectAccount|payload
//!   001  |  r/i/l   | a/i/d| XXXX-XXXX-XXXX-XXXXX or 0000-0000-0000-00000 | free text
//! ```
//!
//! The payload is the trailing field and may itself contain `|`; decoding
//! re-joins everything after the fourth delimiter.
//!
//! ## Validation Order
//!
//! [`AttestationRecord::decode`] validates fields strictly left to right and
//! stops at the first failure, so the reported [`ErrorCode`] is always the
//! one for the leftmost bad field:
//!
//! 1. field count
//! 2. version (length, then value)
//! 3. entity type (length, then code)
//! 4. state (length, then code)
//! 5. redirect account (length, then sentinel-or-syntax)
//! 6. payload length
//!
//! ## State Machine
//!
//! ```text
//! INACTIVE ──▶ ACTIVE ◀──▶ INACTIVE
//!                 │            │
//!                 └─────┬──────┘
//!                       ▼ (redirect only)
//!                  DEPRECATED (terminal)
//! ```

use serde::{Deserialize, Serialize};

use crate::account::{is_valid_suffix, AccountId, ACCOUNT_SUFFIX_LENGTH, NO_REDIRECT};
use crate::error::{ErrorCode, ProtocolError};

/// The only record version this implementation reads or writes.
pub const PROTOCOL_VERSION: &str = "001";

/// Field delimiter of the wire format.
pub const FIELD_DELIMITER: char = '|';

/// Maximum payload length, in characters.
pub const MAX_PAYLOAD_LENGTH: usize = 120;

/// Number of top-level fields (the last one being the payload tail).
const FIELD_COUNT: usize = 5;

// ─── Entity Type ─────────────────────────────────────────────────────

/// Position of an entity in the attestation hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// Self-attested trust anchor.
    Root,
    /// Attested by a root or another intermediate; may attest others.
    Intermediate,
    /// End entity; may create claims but never attest.
    Leaf,
}

impl EntityType {
    /// Single-character wire code.
    pub fn code(&self) -> char {
        match self {
            Self::Root => 'r',
            Self::Intermediate => 'i',
            Self::Leaf => 'l',
        }
    }

    /// Parse a wire code.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'r' => Some(Self::Root),
            'i' => Some(Self::Intermediate),
            'l' => Some(Self::Leaf),
            _ => None,
        }
    }

    /// Whether an entity of this type may attest an entity of `target` type.
    ///
    /// | attestor \ target | ROOT | INTERMEDIATE | LEAF |
    /// |-------------------|------|--------------|------|
    /// | ROOT              | yes  | yes          | yes  |
    /// | INTERMEDIATE      | no   | yes          | yes  |
    /// | LEAF              | no   | no           | no   |
    pub fn may_attest(&self, target: EntityType) -> bool {
        match (self, target) {
            (Self::Root, _) => true,
            (Self::Intermediate, Self::Intermediate | Self::Leaf) => true,
            (Self::Intermediate, Self::Root) => false,
            (Self::Leaf, _) => false,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Root => "ROOT",
            Self::Intermediate => "INTERMEDIATE",
            Self::Leaf => "LEAF",
        })
    }
}

// ─── Entity State ────────────────────────────────────────────────────

/// Lifecycle state of a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityState {
    /// Valid link in a trust chain.
    Active,
    /// Temporarily suspended; never accepted in a chain.
    Inactive,
    /// Superseded; the redirect field names the replacement account.
    Deprecated,
}

impl EntityState {
    /// Single-character wire code.
    pub fn code(&self) -> char {
        match self {
            Self::Active => 'a',
            Self::Inactive => 'i',
            Self::Deprecated => 'd',
        }
    }

    /// Parse a wire code.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'a' => Some(Self::Active),
            'i' => Some(Self::Inactive),
            'd' => Some(Self::Deprecated),
            _ => None,
        }
    }

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deprecated)
    }
}

impl std::fmt::Display for EntityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Deprecated => "DEPRECATED",
        })
    }
}

// ─── Record ──────────────────────────────────────────────────────────

/// A decoded attestation record.
///
/// The version is implied: every value of this type is at
/// [`PROTOCOL_VERSION`], because decoding rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationRecord {
    /// Position in the hierarchy.
    pub entity_type: EntityType,
    /// Lifecycle state.
    pub state: EntityState,
    /// Replacement account, `None` for the sentinel.
    pub redirect_account: Option<AccountId>,
    /// Free-form payload, at most [`MAX_PAYLOAD_LENGTH`] characters.
    pub payload: String,
}

impl AttestationRecord {
    /// A fresh ACTIVE, non-redirected record.
    pub fn active(entity_type: EntityType, payload: impl Into<String>) -> Self {
        Self {
            entity_type,
            state: EntityState::Active,
            redirect_account: None,
            payload: payload.into(),
        }
    }

    /// The record version (always [`PROTOCOL_VERSION`]).
    pub fn version(&self) -> &'static str {
        PROTOCOL_VERSION
    }

    /// Copy of this record marked DEPRECATED and pointing at `destination`.
    pub fn deprecated_to(&self, destination: &AccountId) -> Self {
        Self {
            state: EntityState::Deprecated,
            redirect_account: Some(destination.clone()),
            ..self.clone()
        }
    }

    /// Serialize to the wire format.
    pub fn encode(&self) -> String {
        let redirect = self
            .redirect_account
            .as_ref()
            .map(AccountId::suffix)
            .unwrap_or(NO_REDIRECT);
        format!(
            "{PROTOCOL_VERSION}{d}{}{d}{}{d}{redirect}{d}{}",
            self.entity_type.code(),
            self.state.code(),
            self.payload,
            d = FIELD_DELIMITER,
        )
    }

    /// Parse and validate a wire-format record.
    ///
    /// # Errors
    ///
    /// The codec [`ErrorCode`] of the first invalid field, in the order
    /// documented at module level.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let fields: Vec<&str> = raw.splitn(FIELD_COUNT, FIELD_DELIMITER).collect();
        if fields.len() != FIELD_COUNT {
            return Err(ProtocolError::new(
                ErrorCode::WrongNumberOfDataFields,
                format!("expected {FIELD_COUNT} fields, found {}", fields.len()),
            ));
        }
        let (version, entity, state, redirect, payload) =
            (fields[0], fields[1], fields[2], fields[3], fields[4]);

        validate_version(version)?;
        let entity_type = parse_entity_type(entity)?;
        let state = parse_state(state)?;
        let redirect_account = parse_redirect(redirect)?;
        validate_payload(payload)?;

        Ok(Self {
            entity_type,
            state,
            redirect_account,
            payload: payload.to_string(),
        })
    }
}

impl std::fmt::Display for AttestationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl std::str::FromStr for AttestationRecord {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

// ─── Field Validators ────────────────────────────────────────────────

/// Check the payload length limit.
///
/// # Errors
///
/// `PAYLOAD_TOO_LONG` above [`MAX_PAYLOAD_LENGTH`] characters.
pub fn validate_payload(payload: &str) -> Result<(), ProtocolError> {
    let len = payload.chars().count();
    if len > MAX_PAYLOAD_LENGTH {
        return Err(ProtocolError::new(
            ErrorCode::PayloadTooLong,
            format!("payload is {len} characters, maximum is {MAX_PAYLOAD_LENGTH}"),
        ));
    }
    Ok(())
}

fn validate_version(version: &str) -> Result<(), ProtocolError> {
    if version.chars().count() != PROTOCOL_VERSION.len() {
        return Err(ProtocolError::new(
            ErrorCode::WrongVersionLength,
            format!("version {version:?} must be {} characters", PROTOCOL_VERSION.len()),
        ));
    }
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::new(
            ErrorCode::UnknownVersion,
            format!("version {version:?} is not supported (expected {PROTOCOL_VERSION})"),
        ));
    }
    Ok(())
}

fn single_char(field: &str) -> Option<char> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn parse_entity_type(field: &str) -> Result<EntityType, ProtocolError> {
    let code = single_char(field).ok_or_else(|| {
        ProtocolError::new(
            ErrorCode::WrongEntityTypeLength,
            format!("entity type {field:?} must be 1 character"),
        )
    })?;
    EntityType::from_code(code).ok_or_else(|| {
        ProtocolError::new(
            ErrorCode::UnknownEntityType,
            format!("unknown entity type {code:?}"),
        )
    })
}

fn parse_state(field: &str) -> Result<EntityState, ProtocolError> {
    let code = single_char(field).ok_or_else(|| {
        ProtocolError::new(
            ErrorCode::WrongStateTypeLength,
            format!("state {field:?} must be 1 character"),
        )
    })?;
    EntityState::from_code(code).ok_or_else(|| {
        ProtocolError::new(ErrorCode::UnknownStateType, format!("unknown state {code:?}"))
    })
}

fn parse_redirect(field: &str) -> Result<Option<AccountId>, ProtocolError> {
    if field.chars().count() != ACCOUNT_SUFFIX_LENGTH {
        return Err(ProtocolError::new(
            ErrorCode::WrongRedirectAccountLength,
            format!("redirect account {field:?} must be {ACCOUNT_SUFFIX_LENGTH} characters"),
        ));
    }
    if field == NO_REDIRECT {
        return Ok(None);
    }
    if !is_valid_suffix(field) {
        return Err(ProtocolError::new(
            ErrorCode::InvalidRedirectAccount,
            format!("redirect account {field:?} is not a valid account"),
        ));
    }
    AccountId::from_suffix(field)
        .map(Some)
        .map_err(|e| ProtocolError::new(ErrorCode::InvalidRedirectAccount, e.description))
}
