//! # Attestation Lifecycle
//!
//! Create, update and revoke attestation records, enforcing the hierarchy
//! and the per-record state machine.
//!
//! ## States
//!
//! ```text
//! (create) ──▶ ACTIVE ◀──▶ INACTIVE
//!                 │            │
//!                 └─────┬──────┘
//!                       ▼ (redirect only)
//!                  DEPRECATED (terminal)
//! ```
//!
//! DEPRECATED is never set directly. It is reached only through a redirect,
//! which writes two records: a fresh ACTIVE record on the destination
//! account and the deprecated original pointing at it. The two writes are
//! dispatched together and are not atomic; a partial failure is reported
//! and logged, never rolled back.
//!
//! ## Record Locations
//!
//! A record lives at `(owner, setter, context)`. A ROOT record is
//! self-attested at `(root, root, context)`. Any other record lives at
//! `(target, attestor, context)`. The attestor's own record lives at
//! `(attestor, attested_by, context)`.

use std::sync::Arc;

use apx_core::{
    validate_payload, AccountId, AttestationContext, AttestationRecord, EntityState, EntityType,
    ErrorCode, ProtocolError,
};
use apx_crypto::Identity;
use apx_ledger::LedgerStore;

use crate::reader::{fetch_record, find_record};

// ─── Attestor ────────────────────────────────────────────────────────

/// The signing party of a lifecycle operation.
#[derive(Debug, Clone)]
pub struct Attestor {
    identity: Identity,
    attested_by: Option<AccountId>,
}

impl Attestor {
    /// An attestor whose own record is self-attested (a root).
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            attested_by: None,
        }
    }

    /// Name the account that set this attestor's own record.
    pub fn attested_by(mut self, account: AccountId) -> Self {
        self.attested_by = Some(account);
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn account(&self) -> &AccountId {
        self.identity.account()
    }

    /// Setter of this attestor's own record.
    pub fn record_setter(&self) -> &AccountId {
        self.attested_by.as_ref().unwrap_or(self.identity.account())
    }
}

// ─── Requests ────────────────────────────────────────────────────────

/// Where a deprecated record should point.
#[derive(Debug, Clone)]
pub enum RedirectTarget {
    /// A plain account, for INTERMEDIATE and LEAF records.
    Account(AccountId),
    /// A new self-attested root, which must sign its own record.
    Root(Identity),
}

impl RedirectTarget {
    pub fn account(&self) -> &AccountId {
        match self {
            Self::Account(account) => account,
            Self::Root(identity) => identity.account(),
        }
    }
}

/// Parameters of [`AttestationLifecycle::create`].
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub context: AttestationContext,
    pub entity_type: EntityType,
    pub target: AccountId,
    pub payload: String,
}

/// Parameters of [`AttestationLifecycle::update`].
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub context: AttestationContext,
    pub entity_type: EntityType,
    pub target: AccountId,
    pub new_state: Option<EntityState>,
    pub new_payload: Option<String>,
    pub redirect_to: Option<RedirectTarget>,
}

impl UpdateRequest {
    /// An update that changes nothing yet.
    pub fn new(context: AttestationContext, entity_type: EntityType, target: AccountId) -> Self {
        Self {
            context,
            entity_type,
            target,
            new_state: None,
            new_payload: None,
            redirect_to: None,
        }
    }

    pub fn state(mut self, state: EntityState) -> Self {
        self.new_state = Some(state);
        self
    }

    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.new_payload = Some(payload.into());
        self
    }

    pub fn redirect(mut self, target: RedirectTarget) -> Self {
        self.redirect_to = Some(target);
        self
    }

    fn is_pure_state_change(&self) -> bool {
        self.new_state.is_some() && self.new_payload.is_none() && self.redirect_to.is_none()
    }
}

/// Parameters of [`AttestationLifecycle::revoke`].
#[derive(Debug, Clone)]
pub struct RevokeRequest {
    pub context: AttestationContext,
    pub entity_type: EntityType,
    pub target: AccountId,
}

/// What an update left on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Account now holding the live record.
    pub account: AccountId,
    /// The live record.
    pub record: AttestationRecord,
    /// Set when the update was a redirect; the origin's deprecated record.
    pub deprecated: Option<AttestationRecord>,
}

// ─── Engine ──────────────────────────────────────────────────────────

/// Drives attestation records through their lifecycle.
#[derive(Clone)]
pub struct AttestationLifecycle {
    ledger: Arc<dyn LedgerStore>,
}

impl AttestationLifecycle {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Create an attestation after checking the attestor may issue it.
    pub async fn create(
        &self,
        request: &CreateRequest,
        attestor: &Attestor,
    ) -> Result<AttestationRecord, ProtocolError> {
        validate_payload(&request.payload)?;
        require_root_is_self(request.entity_type, &request.target, attestor)?;

        if request.entity_type == EntityType::Root {
            let existing = find_record(
                self.ledger.as_ref(),
                attestor.account(),
                attestor.account(),
                &request.context,
            )
            .await?;
            if existing.is_some() {
                return Err(already_set(attestor.account(), &request.context));
            }
        } else {
            if request.target == *attestor.account() {
                return Err(ProtocolError::new(
                    ErrorCode::SelfAttestationNotAllowed,
                    format!("{} cannot attest itself as {}", request.target, request.entity_type),
                ));
            }
            self.require_attestor(attestor, &request.context, request.entity_type, true)
                .await?;
            let existing = find_record(
                self.ledger.as_ref(),
                &request.target,
                attestor.account(),
                &request.context,
            )
            .await?;
            if existing.is_some() {
                return Err(already_set(&request.target, &request.context));
            }
        }

        self.write_new(request, attestor).await
    }

    /// Create an attestation without any hierarchy or existence checks.
    ///
    /// Intended for bootstrapping fixtures. The payload is still validated.
    pub async fn create_unchecked(
        &self,
        request: &CreateRequest,
        attestor: &Attestor,
    ) -> Result<AttestationRecord, ProtocolError> {
        validate_payload(&request.payload)?;
        self.write_new(request, attestor).await
    }

    async fn write_new(
        &self,
        request: &CreateRequest,
        attestor: &Attestor,
    ) -> Result<AttestationRecord, ProtocolError> {
        let record = AttestationRecord::active(request.entity_type, request.payload.clone());
        self.ledger
            .set_property(
                &request.target,
                request.context.property_name(),
                &record.encode(),
                attestor.identity(),
            )
            .await?;
        tracing::info!(
            context = %request.context,
            target = %request.target,
            attestor = %attestor.account(),
            entity_type = %request.entity_type,
            "attestation created"
        );
        Ok(record)
    }

    /// Change the state or payload of a record, or deprecate it in favour of
    /// a new account.
    pub async fn update(
        &self,
        request: &UpdateRequest,
        attestor: &Attestor,
    ) -> Result<UpdateOutcome, ProtocolError> {
        if request.new_state.is_none()
            && request.new_payload.is_none()
            && request.redirect_to.is_none()
        {
            return Err(ProtocolError::new(
                ErrorCode::NothingToUpdate,
                "update names no state, payload or redirect",
            ));
        }
        if request.redirect_to.is_some() && request.new_state.is_some() {
            return Err(ProtocolError::new(
                ErrorCode::RedirectWithStateChange,
                "a redirect cannot be combined with a state change",
            ));
        }
        if request.new_state == Some(EntityState::Deprecated) {
            return Err(ProtocolError::new(
                ErrorCode::DeprecateStateCannotBeSet,
                "DEPRECATED is only reachable through a redirect",
            ));
        }
        require_root_is_self(request.entity_type, &request.target, attestor)?;

        let require_active = !request.is_pure_state_change();
        let current = if request.entity_type == EntityType::Root {
            let own = fetch_record(
                self.ledger.as_ref(),
                attestor.account(),
                attestor.account(),
                &request.context,
            )
            .await?;
            if require_active && own.state == EntityState::Inactive {
                return Err(ProtocolError::new(
                    ErrorCode::EntityNotActive,
                    format!("root {} is INACTIVE", attestor.account()),
                ));
            }
            own
        } else {
            self.require_attestor(attestor, &request.context, request.entity_type, require_active)
                .await?;
            fetch_record(
                self.ledger.as_ref(),
                &request.target,
                attestor.account(),
                &request.context,
            )
            .await?
        };

        if current.entity_type != request.entity_type {
            return Err(mismatch(&request.target, request.entity_type, current.entity_type));
        }
        if current.state == EntityState::Deprecated {
            return Err(ProtocolError::new(
                ErrorCode::EntityNotActive,
                format!("{} is deprecated and can no longer be updated", request.target),
            ));
        }

        let mut updated = current.clone();
        if let Some(state) = request.new_state {
            if state == current.state {
                return Err(ProtocolError::new(
                    ErrorCode::StateAlreadySet,
                    format!("{} is already {state}", request.target),
                ));
            }
            updated.state = state;
        }
        if let Some(payload) = &request.new_payload {
            validate_payload(payload)?;
            if *payload == current.payload {
                return Err(ProtocolError::new(
                    ErrorCode::PayloadAlreadySet,
                    format!("{} already carries this payload", request.target),
                ));
            }
            updated.payload = payload.clone();
        }

        match &request.redirect_to {
            Some(destination) => {
                self.redirect(request, attestor, &current, updated, destination)
                    .await
            }
            None => {
                self.ledger
                    .set_property(
                        &request.target,
                        request.context.property_name(),
                        &updated.encode(),
                        attestor.identity(),
                    )
                    .await?;
                tracing::info!(
                    context = %request.context,
                    target = %request.target,
                    state = %updated.state,
                    "attestation updated"
                );
                Ok(UpdateOutcome {
                    account: request.target.clone(),
                    record: updated,
                    deprecated: None,
                })
            }
        }
    }

    /// The two-write deprecation transition.
    async fn redirect(
        &self,
        request: &UpdateRequest,
        attestor: &Attestor,
        current: &AttestationRecord,
        updated: AttestationRecord,
        destination: &RedirectTarget,
    ) -> Result<UpdateOutcome, ProtocolError> {
        let (dest_account, dest_signer) = match (request.entity_type, destination) {
            (EntityType::Root, RedirectTarget::Root(identity)) => (identity.account(), identity),
            (EntityType::Root, RedirectTarget::Account(account)) => {
                return Err(ProtocolError::new(
                    ErrorCode::InvalidRedirectTarget,
                    format!("a root can only be redirected to a signing identity, not {account}"),
                ))
            }
            (_, RedirectTarget::Account(account)) => (account, attestor.identity()),
            (entity_type, RedirectTarget::Root(identity)) => {
                return Err(ProtocolError::new(
                    ErrorCode::InvalidRedirectTarget,
                    format!(
                        "a {entity_type} redirect names a plain account, not root identity {}",
                        identity.account()
                    ),
                ))
            }
        };
        if *dest_account == request.target {
            return Err(ProtocolError::new(
                ErrorCode::InvalidRedirectTarget,
                format!("{} cannot redirect to itself", request.target),
            ));
        }

        let existing = find_record(
            self.ledger.as_ref(),
            dest_account,
            dest_signer.account(),
            &request.context,
        )
        .await?;
        if existing.is_some() {
            return Err(already_set(dest_account, &request.context));
        }

        let fresh = AttestationRecord::active(request.entity_type, updated.payload);
        let deprecated = current.deprecated_to(dest_account);
        let property = request.context.property_name();
        let fresh_encoded = fresh.encode();
        let deprecated_encoded = deprecated.encode();

        let (dest_write, origin_write) = tokio::join!(
            self.ledger
                .set_property(dest_account, property, &fresh_encoded, dest_signer),
            self.ledger.set_property(
                &request.target,
                property,
                &deprecated_encoded,
                attestor.identity(),
            ),
        );

        let destination_written = dest_write.is_ok();
        let origin_deprecated = origin_write.is_ok();
        if let Err(err) = dest_write.and(origin_write) {
            tracing::warn!(
                context = %request.context,
                origin = %request.target,
                destination = %dest_account,
                destination_written,
                origin_deprecated,
                "redirect partially applied"
            );
            return Err(err.into());
        }

        tracing::info!(
            context = %request.context,
            origin = %request.target,
            destination = %dest_account,
            "attestation redirected"
        );
        Ok(UpdateOutcome {
            account: dest_account.clone(),
            record: fresh,
            deprecated: Some(deprecated),
        })
    }

    /// Delete an attestation after checking the attestor and the record's
    /// entity type.
    pub async fn revoke(
        &self,
        request: &RevokeRequest,
        attestor: &Attestor,
    ) -> Result<(), ProtocolError> {
        require_root_is_self(request.entity_type, &request.target, attestor)?;

        let current = if request.entity_type == EntityType::Root {
            fetch_record(
                self.ledger.as_ref(),
                attestor.account(),
                attestor.account(),
                &request.context,
            )
            .await?
        } else {
            self.require_attestor(attestor, &request.context, request.entity_type, false)
                .await?;
            fetch_record(
                self.ledger.as_ref(),
                &request.target,
                attestor.account(),
                &request.context,
            )
            .await?
        };
        if current.entity_type != request.entity_type {
            return Err(mismatch(&request.target, request.entity_type, current.entity_type));
        }

        self.revoke_unchecked(request, attestor).await
    }

    /// Delete an attestation without any checks.
    pub async fn revoke_unchecked(
        &self,
        request: &RevokeRequest,
        attestor: &Attestor,
    ) -> Result<(), ProtocolError> {
        self.ledger
            .delete_property(
                &request.target,
                request.context.property_name(),
                attestor.identity(),
            )
            .await?;
        tracing::info!(
            context = %request.context,
            target = %request.target,
            attestor = %attestor.account(),
            "attestation revoked"
        );
        Ok(())
    }

    /// Fetch the attestor's own record and check it may attest `target_type`.
    ///
    /// With `require_active` unset, an INACTIVE attestor is tolerated.
    /// A DEPRECATED attestor is always refused.
    async fn require_attestor(
        &self,
        attestor: &Attestor,
        context: &AttestationContext,
        target_type: EntityType,
        require_active: bool,
    ) -> Result<AttestationRecord, ProtocolError> {
        let own = fetch_record(
            self.ledger.as_ref(),
            attestor.account(),
            attestor.record_setter(),
            context,
        )
        .await?;

        let usable = match own.state {
            EntityState::Active => true,
            EntityState::Inactive => !require_active,
            EntityState::Deprecated => false,
        };
        if !usable {
            return Err(ProtocolError::new(
                ErrorCode::EntityNotActive,
                format!("attestor {} is {}", attestor.account(), own.state),
            ));
        }
        if !own.entity_type.may_attest(target_type) {
            return Err(ProtocolError::new(
                ErrorCode::AttestationNotAllowed,
                format!(
                    "{} attestor {} may not attest {target_type}",
                    own.entity_type,
                    attestor.account()
                ),
            ));
        }
        Ok(own)
    }
}

fn require_root_is_self(
    entity_type: EntityType,
    target: &AccountId,
    attestor: &Attestor,
) -> Result<(), ProtocolError> {
    if entity_type == EntityType::Root && target != attestor.account() {
        return Err(ProtocolError::new(
            ErrorCode::AttestationNotAllowed,
            format!(
                "a root is self-attested; {} cannot act on root {target}",
                attestor.account()
            ),
        ));
    }
    Ok(())
}

fn already_set(account: &AccountId, context: &AttestationContext) -> ProtocolError {
    ProtocolError::new(
        ErrorCode::AttestationContextAlreadySet,
        format!("{account} already has a {context} attestation"),
    )
}

fn mismatch(account: &AccountId, expected: EntityType, found: EntityType) -> ProtocolError {
    ProtocolError::new(
        ErrorCode::EntityMismatch,
        format!("{account} is {found}, expected {expected}"),
    )
}
