//! The ledger seam.
//!
//! A ledger maps `(owner, setter, property)` to a string value. The setter of
//! a write is always the account of the signing [`Identity`]; reads name the
//! setter explicitly because any account may read any property.

use apx_core::{AccountId, TransportError};
use apx_crypto::Identity;

/// Account-property store consumed by the engine.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Read the value `setter` stored on `owner` under `property`.
    ///
    /// Absence is `Ok(None)`, never an error.
    async fn get_property(
        &self,
        owner: &AccountId,
        setter: &AccountId,
        property: &str,
    ) -> Result<Option<String>, TransportError>;

    /// Store `value` on `owner` under `property`, set by `signer`.
    async fn set_property(
        &self,
        owner: &AccountId,
        property: &str,
        value: &str,
        signer: &Identity,
    ) -> Result<(), TransportError>;

    /// Remove the property `signer` set on `owner`.
    async fn delete_property(
        &self,
        owner: &AccountId,
        property: &str,
        signer: &Identity,
    ) -> Result<(), TransportError>;
}
