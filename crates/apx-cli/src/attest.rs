//! # Attest Subcommand
//!
//! Create, update and revoke attestations on the ledger.
//!
//! ## Subcommands
//!
//! - `create`: Attest an account (or self, for a root).
//! - `update`: Change state or payload, or redirect to a new account.
//! - `revoke`: Delete an attestation.
//!
//! The acting account is derived from `--secret`. When that account is not
//! a root, `--attested-by` names who attested it.

use std::sync::Arc;

use anyhow::{bail, Result};
use apx_core::{AccountId, AttestationContext, EntityType};
use apx_engine::{
    AttestationLifecycle, Attestor, CreateRequest, RedirectTarget, RevokeRequest, UpdateRequest,
};
use apx_ledger::LedgerStore;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::args::{account, identity, EntityTypeArg, SecretArgs, StateArg};

/// Arguments for the `apx attest` subcommand.
#[derive(Args, Debug)]
pub struct AttestArgs {
    #[command(subcommand)]
    pub command: AttestCommand,
}

/// Options every attest subcommand shares.
#[derive(Args, Debug, Clone)]
pub struct Target {
    #[arg(long)]
    pub context: String,
    #[arg(long = "type", value_enum)]
    pub entity_type: EntityTypeArg,
    /// Account being attested. Defaults to the signer, for roots.
    #[arg(long)]
    pub target: Option<String>,
    #[command(flatten)]
    pub signer: SecretArgs,
    /// Account that attested the signer.
    #[arg(long)]
    pub attested_by: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum AttestCommand {
    /// Create a new attestation.
    Create {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value = "")]
        payload: String,
        /// Skip hierarchy and existence checks.
        #[arg(long)]
        unchecked: bool,
    },

    /// Update an existing attestation.
    Update {
        #[command(flatten)]
        target: Target,
        #[arg(long, value_enum)]
        state: Option<StateArg>,
        #[arg(long)]
        payload: Option<String>,
        /// Deprecate the record in favour of this account.
        #[arg(long, conflicts_with = "redirect_secret")]
        redirect_to: Option<String>,
        /// Deprecate a root in favour of the root controlled by this secret.
        #[arg(long, hide_env_values = true, env = "APX_REDIRECT_SECRET")]
        redirect_secret: Option<String>,
    },

    /// Revoke an attestation.
    Revoke {
        #[command(flatten)]
        target: Target,
        /// Skip attestor and entity-type checks.
        #[arg(long)]
        unchecked: bool,
    },
}

/// What an attest command did, for printing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestOutput {
    pub action: &'static str,
    pub account: String,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
}

/// Execute the `attest` subcommand against `ledger`.
pub async fn run_attest(args: &AttestArgs, ledger: Arc<dyn LedgerStore>) -> Result<u8> {
    let output = execute(&args.command, ledger).await?;
    crate::print_json(&output)?;
    Ok(0)
}

pub async fn execute(command: &AttestCommand, ledger: Arc<dyn LedgerStore>) -> Result<AttestOutput> {
    let lifecycle = AttestationLifecycle::new(ledger);

    match command {
        AttestCommand::Create {
            target,
            payload,
            unchecked,
        } => {
            let (attestor, context, entity_type, subject) = resolve(target)?;
            let request = CreateRequest {
                context: context.clone(),
                entity_type,
                target: subject.clone(),
                payload: payload.clone(),
            };
            let record = if *unchecked {
                lifecycle.create_unchecked(&request, &attestor).await?
            } else {
                lifecycle.create(&request, &attestor).await?
            };
            Ok(AttestOutput {
                action: "created",
                account: subject.to_string(),
                context: context.to_string(),
                record: Some(record.encode()),
                deprecated: None,
            })
        }

        AttestCommand::Update {
            target,
            state,
            payload,
            redirect_to,
            redirect_secret,
        } => {
            let (attestor, context, entity_type, subject) = resolve(target)?;
            let mut request = UpdateRequest::new(context.clone(), entity_type, subject);
            request.new_state = state.map(Into::into);
            request.new_payload = payload.clone();
            request.redirect_to = match (redirect_to, redirect_secret) {
                (Some(_), Some(_)) => bail!("use either --redirect-to or --redirect-secret"),
                (Some(raw), None) => Some(RedirectTarget::Account(account(raw)?)),
                (None, Some(secret)) => Some(RedirectTarget::Root(identity(secret))),
                (None, None) => None,
            };
            let outcome = lifecycle.update(&request, &attestor).await?;
            Ok(AttestOutput {
                action: if outcome.deprecated.is_some() {
                    "redirected"
                } else {
                    "updated"
                },
                account: outcome.account.to_string(),
                context: context.to_string(),
                record: Some(outcome.record.encode()),
                deprecated: outcome.deprecated.map(|r| r.encode()),
            })
        }

        AttestCommand::Revoke { target, unchecked } => {
            let (attestor, context, entity_type, subject) = resolve(target)?;
            let request = RevokeRequest {
                context: context.clone(),
                entity_type,
                target: subject.clone(),
            };
            if *unchecked {
                lifecycle.revoke_unchecked(&request, &attestor).await?;
            } else {
                lifecycle.revoke(&request, &attestor).await?;
            }
            Ok(AttestOutput {
                action: "revoked",
                account: subject.to_string(),
                context: context.to_string(),
                record: None,
                deprecated: None,
            })
        }
    }
}

fn resolve(target: &Target) -> Result<(Attestor, AttestationContext, EntityType, AccountId)> {
    let signer = target.signer.identity();
    let subject = match &target.target {
        Some(raw) => account(raw)?,
        None => signer.account().clone(),
    };
    let mut attestor = Attestor::new(signer);
    if let Some(raw) = &target.attested_by {
        attestor = attestor.attested_by(account(raw)?);
    }
    Ok((
        attestor,
        AttestationContext::new(&target.context),
        target.entity_type.into(),
        subject,
    ))
}
