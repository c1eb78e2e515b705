//! Read-only record lookup.

use std::sync::Arc;

use apx_core::{
    AccountId, AttestationContext, AttestationRecord, EntityState, EntityType, ErrorCode,
    ProtocolError,
};
use apx_ledger::LedgerStore;
use serde::{Deserialize, Serialize};

/// A decoded record together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationEntity {
    pub account: AccountId,
    pub attestor: AccountId,
    pub context: AttestationContext,
    pub version: String,
    pub entity_type: EntityType,
    pub state: EntityState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_account: Option<AccountId>,
    pub payload: String,
}

impl AttestationEntity {
    pub fn from_record(
        account: AccountId,
        attestor: AccountId,
        context: AttestationContext,
        record: AttestationRecord,
    ) -> Self {
        Self {
            account,
            attestor,
            context,
            version: record.version().to_string(),
            entity_type: record.entity_type,
            state: record.state,
            redirect_account: record.redirect_account,
            payload: record.payload,
        }
    }
}

/// Looks up single attestation records.
#[derive(Clone)]
pub struct EntityReader {
    ledger: Arc<dyn LedgerStore>,
}

impl EntityReader {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Fetch the record `attestor` set on `account`. `attestor` defaults to
    /// `account` itself.
    pub async fn get(
        &self,
        account: &AccountId,
        attestor: Option<&AccountId>,
        context: &AttestationContext,
    ) -> Result<AttestationEntity, ProtocolError> {
        let attestor = attestor.unwrap_or(account);
        let record = fetch_record(self.ledger.as_ref(), account, attestor, context).await?;
        Ok(AttestationEntity::from_record(
            account.clone(),
            attestor.clone(),
            context.clone(),
            record,
        ))
    }
}

/// Fetch and decode a record, if present.
pub(crate) async fn find_record(
    ledger: &dyn LedgerStore,
    owner: &AccountId,
    setter: &AccountId,
    context: &AttestationContext,
) -> Result<Option<AttestationRecord>, ProtocolError> {
    match ledger
        .get_property(owner, setter, context.property_name())
        .await?
    {
        Some(raw) => AttestationRecord::decode(&raw).map(Some),
        None => Ok(None),
    }
}

/// Fetch and decode a record that must exist.
pub(crate) async fn fetch_record(
    ledger: &dyn LedgerStore,
    owner: &AccountId,
    setter: &AccountId,
    context: &AttestationContext,
) -> Result<AttestationRecord, ProtocolError> {
    find_record(ledger, owner, setter, context)
        .await?
        .ok_or_else(|| {
            ProtocolError::new(
                ErrorCode::AttestationContextNotFound,
                format!("no {context} attestation on {owner} set by {setter}"),
            )
        })
}
