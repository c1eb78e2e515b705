//! # Entity Subcommand
//!
//! Read a single attestation record from the ledger.

use std::sync::Arc;

use anyhow::Result;
use apx_core::AttestationContext;
use apx_engine::{AttestationEntity, EntityReader};
use apx_ledger::LedgerStore;
use clap::{Args, Subcommand};

use crate::args::account;

/// Arguments for the `apx entity` subcommand.
#[derive(Args, Debug)]
pub struct EntityArgs {
    #[command(subcommand)]
    pub command: EntityCommand,
}

#[derive(Subcommand, Debug)]
pub enum EntityCommand {
    /// Fetch and decode the record an attestor set on an account.
    Get {
        #[arg(long)]
        account: String,
        /// Setter of the record. Defaults to the account itself.
        #[arg(long)]
        attestor: Option<String>,
        #[arg(long)]
        context: String,
    },
}

/// Execute the `entity` subcommand against `ledger`.
pub async fn run_entity(args: &EntityArgs, ledger: Arc<dyn LedgerStore>) -> Result<u8> {
    let entity = execute(&args.command, ledger).await?;
    crate::print_json(&entity)?;
    Ok(0)
}

pub async fn execute(
    command: &EntityCommand,
    ledger: Arc<dyn LedgerStore>,
) -> Result<AttestationEntity> {
    match command {
        EntityCommand::Get {
            account: owner,
            attestor,
            context,
        } => {
            let owner = account(owner)?;
            let attestor = attestor.as_deref().map(account).transpose()?;
            let context = AttestationContext::new(context);
            let entity = EntityReader::new(ledger)
                .get(&owner, attestor.as_ref(), &context)
                .await?;
            Ok(entity)
        }
    }
}
