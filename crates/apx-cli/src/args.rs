//! Argument types shared by several subcommands.

use std::sync::Arc;

use anyhow::{Context, Result};
use apx_core::{AccountId, EntityState, EntityType};
use apx_crypto::{Ed25519Provider, Identity};
use apx_ledger::{HttpLedgerClient, LedgerConfig, LedgerStore};
use clap::{Args, ValueEnum};

/// Entity type as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityTypeArg {
    Root,
    Intermediate,
    Leaf,
}

impl From<EntityTypeArg> for EntityType {
    fn from(arg: EntityTypeArg) -> Self {
        match arg {
            EntityTypeArg::Root => EntityType::Root,
            EntityTypeArg::Intermediate => EntityType::Intermediate,
            EntityTypeArg::Leaf => EntityType::Leaf,
        }
    }
}

/// Entity state as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Active,
    Inactive,
    Deprecated,
}

impl From<StateArg> for EntityState {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Active => EntityState::Active,
            StateArg::Inactive => EntityState::Inactive,
            StateArg::Deprecated => EntityState::Deprecated,
        }
    }
}

/// Where to find the ledger node.
#[derive(Args, Debug, Clone, Default)]
pub struct LedgerArgs {
    /// Ledger node URL. Falls back to `APX_LEDGER_URL`, then the local default.
    #[arg(long, global = true)]
    pub ledger_url: Option<String>,
}

impl LedgerArgs {
    /// Build an HTTP ledger client.
    pub fn connect(&self) -> Result<Arc<dyn LedgerStore>> {
        let config = match &self.ledger_url {
            Some(url) => LedgerConfig::with_url(url)?,
            None => LedgerConfig::from_env()?,
        };
        tracing::debug!(base_url = %config.base_url, "connecting to ledger");
        let client = HttpLedgerClient::new(config, Arc::new(Ed25519Provider::new()))?;
        Ok(Arc::new(client))
    }
}

/// The signing secret of the acting account.
#[derive(Args, Clone)]
pub struct SecretArgs {
    /// Secret passphrase of the signing account.
    #[arg(long, env = "APX_SECRET", hide_env_values = true)]
    pub secret: String,
}

impl std::fmt::Debug for SecretArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretArgs")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl SecretArgs {
    pub fn identity(&self) -> Identity {
        identity(&self.secret)
    }
}

pub fn identity(secret: &str) -> Identity {
    Identity::new(&Ed25519Provider::new(), secret)
}

/// Parse an account argument, with a readable error.
pub fn account(raw: &str) -> Result<AccountId> {
    AccountId::new(raw).with_context(|| format!("invalid account {raw:?}"))
}
