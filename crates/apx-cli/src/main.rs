//! # apx CLI Entry Point
//!
//! Parses arguments, installs the tracing subscriber, and dispatches to the
//! subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use apx_cli::args::LedgerArgs;
use apx_cli::attest::{run_attest, AttestArgs};
use apx_cli::claim::{run_claim, ClaimArgs};
use apx_cli::entity::{run_entity, EntityArgs};
use apx_cli::record::{run_record, RecordArgs};

/// Attestation protocol toolchain.
///
/// Encodes records, manages attestations on a ledger node, and signs and
/// verifies claims against a chain of trust.
#[derive(Parser, Debug)]
#[command(name = "apx", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    ledger: LedgerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode or decode wire-format records.
    Record(RecordArgs),

    /// Read an attestation from the ledger.
    Entity(EntityArgs),

    /// Create, update, or revoke attestations.
    Attest(AttestArgs),

    /// Sign a claim or verify its trust chain.
    Claim(ClaimArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "apx CLI starting");

    let result = run(cli.command, &cli.ledger).await;

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(command: Commands, ledger: &LedgerArgs) -> anyhow::Result<u8> {
    match command {
        Commands::Record(args) => run_record(&args),
        Commands::Entity(args) => run_entity(&args, ledger.connect()?).await,
        Commands::Attest(args) => run_attest(&args, ledger.connect()?).await,
        Commands::Claim(args) => run_claim(&args, ledger.connect()?).await,
    }
}
