//! # Record Subcommand
//!
//! Offline encoding and decoding of the attestation record wire format.
//! No ledger access.

use anyhow::Result;
use apx_core::{AttestationRecord, EntityState};
use clap::{Args, Subcommand};

use crate::args::{account, EntityTypeArg, StateArg};

/// Arguments for the `apx record` subcommand.
#[derive(Args, Debug)]
pub struct RecordArgs {
    #[command(subcommand)]
    pub command: RecordCommand,
}

#[derive(Subcommand, Debug)]
pub enum RecordCommand {
    /// Decode a wire-format record and print it as JSON.
    Decode {
        /// The raw `version|type|state|redirect|payload` string.
        raw: String,
    },

    /// Encode a record into the wire format.
    Encode {
        #[arg(long = "type", value_enum)]
        entity_type: EntityTypeArg,
        #[arg(long, value_enum, default_value = "active")]
        state: StateArg,
        /// Redirect account, for deprecated records.
        #[arg(long)]
        redirect: Option<String>,
        #[arg(long, default_value = "")]
        payload: String,
    },
}

/// Execute the `record` subcommand, printing the result.
pub fn run_record(args: &RecordArgs) -> Result<u8> {
    match &args.command {
        RecordCommand::Decode { raw } => {
            crate::print_json(&decode(raw)?)?;
        }
        RecordCommand::Encode {
            entity_type,
            state,
            redirect,
            payload,
        } => {
            println!("{}", encode(*entity_type, *state, redirect.as_deref(), payload)?);
        }
    }
    Ok(0)
}

pub fn decode(raw: &str) -> Result<AttestationRecord> {
    Ok(AttestationRecord::decode(raw)?)
}

/// Build and encode a record. The result is decoded again so that the
/// output is always a valid record.
pub fn encode(
    entity_type: EntityTypeArg,
    state: StateArg,
    redirect: Option<&str>,
    payload: &str,
) -> Result<String> {
    let state = EntityState::from(state);
    let redirect_account = redirect.map(account).transpose()?;
    if state == EntityState::Deprecated && redirect_account.is_none() {
        anyhow::bail!("a deprecated record needs --redirect");
    }
    let record = AttestationRecord {
        entity_type: entity_type.into(),
        state,
        redirect_account,
        payload: payload.to_string(),
    };
    let encoded = record.encode();
    AttestationRecord::decode(&encoded)?;
    Ok(encoded)
}
