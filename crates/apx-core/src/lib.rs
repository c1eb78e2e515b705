//! # apx-core: Protocol Primitives
//!
//! This crate is the leaf of the workspace. It defines the wire format and
//! the vocabulary every other crate speaks:
//!
//! - **Accounts** (`account.rs`): validated [`AccountId`] newtype and the
//!   20-character suffix syntax used in redirect fields.
//! - **Contexts** (`context.rs`): [`AttestationContext`], always normalized
//!   to carry the `ap://` prefix.
//! - **Records** (`record.rs`): [`AttestationRecord`], [`EntityType`],
//!   [`EntityState`] and the `version|type|state|redirect|payload` codec.
//! - **Errors** (`error.rs`): [`ProtocolError`] with its closed
//!   [`ErrorCode`] taxonomy, and the transport-error classifier.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `apx-*` crates.
//! - No I/O and no async.
//! - No `.unwrap()` outside tests.

pub mod account;
pub mod context;
pub mod error;
pub mod record;

pub use account::{AccountId, ACCOUNT_PREFIX, NO_REDIRECT};
pub use context::{normalize_context, AttestationContext, CONTEXT_PREFIX};
pub use error::{ErrorCode, ErrorGroup, ProtocolError, TransportError};
pub use record::{
    validate_payload, AttestationRecord, EntityState, EntityType, MAX_PAYLOAD_LENGTH,
    PROTOCOL_VERSION,
};

/// Upper bound on deprecation redirects followed for one chain position.
pub const MAX_DEPRECATION_HOPS: usize = 20;
