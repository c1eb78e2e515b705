//! # Claim Subcommand
//!
//! Sign claims and verify them against the ledger.
//!
//! A claim is written as camelCase JSON, to stdout or to `--out`. `verify`
//! reads the same format back and walks the trust chain from the creator to
//! `--trusted-root`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use apx_core::AttestationContext;
use apx_crypto::Ed25519Provider;
use apx_engine::{Rejection, SignedClaim, TrustChainVerifier, VerificationResult, VerifyOptions};
use apx_ledger::LedgerStore;
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Subcommand};

use crate::args::{account, SecretArgs};

/// Arguments for the `apx claim` subcommand.
#[derive(Args, Debug)]
pub struct ClaimArgs {
    #[command(subcommand)]
    pub command: ClaimCommand,
}

#[derive(Subcommand, Debug)]
pub enum ClaimCommand {
    /// Sign a claim as the account controlled by `--secret`.
    Create {
        #[command(flatten)]
        signer: SecretArgs,
        #[arg(long)]
        context: String,
        #[arg(long, default_value = "")]
        payload: String,
        /// Accounts above the creator, nearest first, ending at a root.
        #[arg(long = "path", num_args = 1..)]
        path: Vec<String>,
        /// Write the claim here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Verify a claim file against a trusted root.
    Verify {
        #[arg(long)]
        claim: PathBuf,
        #[arg(long)]
        trusted_root: String,
        /// Reject claims signed more than this many seconds ago.
        #[arg(long)]
        max_age_secs: Option<u64>,
    },
}

/// Execute the `claim` subcommand against `ledger`.
pub async fn run_claim(args: &ClaimArgs, ledger: Arc<dyn LedgerStore>) -> Result<u8> {
    match &args.command {
        ClaimCommand::Create {
            signer,
            context,
            payload,
            path,
            out,
        } => {
            let claim = create(signer, context, payload, path)?;
            match out {
                Some(out) => {
                    let json = serde_json::to_string_pretty(&claim)?;
                    std::fs::write(out, json)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    tracing::info!(path = %out.display(), "claim written");
                }
                None => crate::print_json(&claim)?,
            }
            Ok(0)
        }
        ClaimCommand::Verify {
            claim,
            trusted_root,
            max_age_secs,
        } => {
            let raw = std::fs::read_to_string(claim)
                .with_context(|| format!("failed to read {}", claim.display()))?;
            let claim: SignedClaim = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a signed claim", claim.display()))?;
            let result = verify(&claim, trusted_root, *max_age_secs, ledger).await?;
            crate::print_json(&result)?;
            Ok(0)
        }
    }
}

pub fn create(
    signer: &SecretArgs,
    context: &str,
    payload: &str,
    path: &[String],
) -> Result<SignedClaim> {
    let path = path.iter().map(|raw| account(raw)).collect::<Result<Vec<_>>>()?;
    Ok(SignedClaim::create(
        &Ed25519Provider::new(),
        &signer.identity(),
        AttestationContext::new(context),
        payload,
        path,
    ))
}

pub async fn verify(
    claim: &SignedClaim,
    trusted_root: &str,
    max_age_secs: Option<u64>,
    ledger: Arc<dyn LedgerStore>,
) -> Result<VerificationResult> {
    let trusted_root = account(trusted_root)?;
    let mut options = VerifyOptions::new();
    if let Some(secs) = max_age_secs {
        let max_age = Duration::seconds(i64::from(u32::try_from(secs).unwrap_or(u32::MAX)));
        options = options.with_claim_check(
            move |_: &SignedClaim, signed_at: DateTime<Utc>| -> Result<(), Rejection> {
                if Utc::now() - signed_at > max_age {
                    return Err(Rejection::new(format!("claim signed at {signed_at} is too old")));
                }
                Ok(())
            },
        );
    }
    let verifier = TrustChainVerifier::new(ledger, Arc::new(Ed25519Provider::new()));
    Ok(verifier.verify(claim, &trusted_root, &options).await?)
}
