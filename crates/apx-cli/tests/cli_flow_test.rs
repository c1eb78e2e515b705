//! End-to-end CLI handler flows against an in-memory ledger.

use std::sync::Arc;

use apx_cli::args::{identity, SecretArgs};
use apx_cli::attest::{self, AttestCommand};
use apx_cli::claim::{self, ClaimArgs, ClaimCommand};
use apx_cli::entity::{self, EntityCommand};
use apx_core::{EntityState, EntityType, ErrorCode, ProtocolError};
use apx_ledger::{LedgerStore, MemoryLedger};
use clap::Parser;

#[derive(Parser, Debug)]
struct AttestHarness {
    #[command(subcommand)]
    command: AttestCommand,
}

fn attest_command(args: &[&str]) -> AttestCommand {
    AttestHarness::try_parse_from(std::iter::once("attest").chain(args.iter().copied()))
        .unwrap()
        .command
}

fn ledger() -> Arc<dyn LedgerStore> {
    Arc::new(MemoryLedger::new())
}

async fn build_hierarchy(ledger: &Arc<dyn LedgerStore>) {
    let alice = identity("alice").account().to_string();
    let bob = identity("bob").account().to_string();
    let carol = identity("carol").account().to_string();

    for args in [
        vec!["create", "--context", "kyc", "--type", "root", "--secret", "alice"],
        vec![
            "create", "--context", "kyc", "--type", "intermediate", "--target", bob.as_str(),
            "--secret", "alice",
        ],
        vec![
            "create", "--context", "kyc", "--type", "leaf", "--target", carol.as_str(), "--secret",
            "bob", "--attested-by", alice.as_str(), "--payload", "over-18",
        ],
    ] {
        attest::execute(&attest_command(&args), ledger.clone())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn attest_then_read_entity() {
    let ledger = ledger();
    build_hierarchy(&ledger).await;

    let carol = identity("carol").account().to_string();
    let bob = identity("bob").account().to_string();
    let entity = entity::execute(
        &EntityCommand::Get {
            account: carol.clone(),
            attestor: Some(bob),
            context: "kyc".to_string(),
        },
        ledger,
    )
    .await
    .unwrap();

    assert_eq!(entity.account.as_str(), carol);
    assert_eq!(entity.entity_type, EntityType::Leaf);
    assert_eq!(entity.state, EntityState::Active);
    assert_eq!(entity.payload, "over-18");
}

#[tokio::test]
async fn missing_entity_surfaces_protocol_error() {
    let err = entity::execute(
        &EntityCommand::Get {
            account: identity("nobody").account().to_string(),
            attestor: None,
            context: "kyc".to_string(),
        },
        ledger(),
    )
    .await
    .unwrap_err();
    let protocol = err.downcast_ref::<ProtocolError>().unwrap();
    assert_eq!(protocol.code, ErrorCode::AttestationContextNotFound);
}

#[tokio::test]
async fn root_redirect_reports_both_records() {
    let ledger = ledger();
    build_hierarchy(&ledger).await;

    let output = attest::execute(
        &attest_command(&[
            "update",
            "--context",
            "kyc",
            "--type",
            "root",
            "--secret",
            "alice",
            "--redirect-secret",
            "alice-2026",
        ]),
        ledger.clone(),
    )
    .await
    .unwrap();

    assert_eq!(output.action, "redirected");
    assert_eq!(output.account, identity("alice-2026").account().to_string());
    assert!(output.deprecated.unwrap().starts_with("001|r|d|"));
    assert!(output.record.unwrap().starts_with("001|r|a|"));
}

#[tokio::test]
async fn signed_claim_round_trips_through_a_file() {
    let ledger = ledger();
    build_hierarchy(&ledger).await;

    let alice = identity("alice").account().to_string();
    let bob = identity("bob").account().to_string();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("claim.json");

    let create = ClaimArgs {
        command: ClaimCommand::Create {
            signer: SecretArgs {
                secret: "carol".to_string(),
            },
            context: "kyc".to_string(),
            payload: "over-18".to_string(),
            path: vec![bob.clone(), alice.clone()],
            out: Some(out.clone()),
        },
    };
    assert_eq!(claim::run_claim(&create, ledger.clone()).await.unwrap(), 0);

    let raw = std::fs::read_to_string(&out).unwrap();
    let signed: apx_engine::SignedClaim = serde_json::from_str(&raw).unwrap();
    let result = claim::verify(&signed, &alice, Some(3600), ledger).await.unwrap();

    assert_eq!(result.active_root_account.as_str(), alice);
    assert_eq!(result.verified_trust_chain.len(), 3);
}

#[tokio::test]
async fn claim_from_revoked_leaf_fails() {
    let ledger = ledger();
    build_hierarchy(&ledger).await;

    let alice = identity("alice").account().to_string();
    let bob = identity("bob").account().to_string();
    let carol = identity("carol").account().to_string();
    attest::execute(
        &attest_command(&[
            "revoke",
            "--context",
            "kyc",
            "--type",
            "leaf",
            "--target",
            carol.as_str(),
            "--secret",
            "bob",
            "--attested-by",
            alice.as_str(),
        ]),
        ledger.clone(),
    )
    .await
    .unwrap();

    let signer = SecretArgs {
        secret: "carol".to_string(),
    };
    let signed = claim::create(&signer, "kyc", "over-18", &[bob, alice.clone()]).unwrap();
    let err = claim::verify(&signed, &alice, None, ledger).await.unwrap_err();
    let protocol = err.downcast_ref::<ProtocolError>().unwrap();
    assert_eq!(protocol.code, ErrorCode::AttestationContextNotFound);
}

#[test]
fn claim_create_rejects_bad_path_account() {
    let signer = SecretArgs {
        secret: "carol".to_string(),
    };
    assert!(claim::create(&signer, "kyc", "", &["not-an-account".to_string()]).is_err());
}
