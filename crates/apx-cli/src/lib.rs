//! # apx-cli: Attestation Protocol Command-Line Interface
//!
//! Thin front end over the protocol crates.
//!
//! ## Subcommands
//!
//! - `record`: offline wire-format encoding and decoding
//! - `entity`: read one attestation from the ledger
//! - `attest`: create, update, and revoke attestations
//! - `claim`: sign claims and verify trust chains
//!
//! Handlers take the ledger as an `Arc<dyn LedgerStore>` so they run the same
//! against the HTTP client or an in-memory ledger.

pub mod args;
pub mod attest;
pub mod claim;
pub mod entity;
pub mod record;

use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
