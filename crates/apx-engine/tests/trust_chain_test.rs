//! Trust-chain verification scenarios: plain walks, deprecation redirects
//! at every position, the hop bound, positional rules, and the acceptance
//! callbacks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use apx_core::{AccountId, AttestationContext, EntityType, ErrorCode, ProtocolError};
use apx_crypto::{Ed25519Provider, Identity};
use apx_engine::{
    AttestationEntity, AttestationLifecycle, Attestor, CreateRequest, RedirectTarget, Rejection,
    SignedClaim, TrustChainVerifier, UpdateRequest, VerificationResult, VerifyOptions,
};
use apx_ledger::MemoryLedger;
use chrono::{DateTime, Utc};

// -- Helpers ------------------------------------------------------------------

fn identity(secret: &str) -> Identity {
    Identity::new(&Ed25519Provider::new(), secret)
}

fn ctx() -> AttestationContext {
    AttestationContext::new("kyc")
}

struct World {
    ledger: Arc<MemoryLedger>,
    lifecycle: AttestationLifecycle,
    verifier: TrustChainVerifier,
    provider: Ed25519Provider,
}

impl World {
    fn new() -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let provider = Ed25519Provider::new();
        Self {
            lifecycle: AttestationLifecycle::new(ledger.clone()),
            verifier: TrustChainVerifier::new(ledger.clone(), Arc::new(provider)),
            ledger,
            provider,
        }
    }

    async fn root(&self, root: &Identity) {
        self.attest(EntityType::Root, root, &Attestor::new(root.clone()))
            .await;
    }

    async fn attest(&self, entity_type: EntityType, target: &Identity, attestor: &Attestor) {
        let request = CreateRequest {
            context: ctx(),
            entity_type,
            target: target.account().clone(),
            payload: format!("{entity_type}"),
        };
        self.lifecycle.create(&request, attestor).await.unwrap();
    }

    /// Write a raw record, bypassing every lifecycle rule.
    fn raw(&self, owner: &Identity, setter: &Identity, value: &str) {
        self.ledger
            .insert(owner.account(), setter.account(), ctx().property_name(), value);
    }

    fn claim(&self, creator: &Identity, path: &[&Identity]) -> SignedClaim {
        SignedClaim::create(
            &self.provider,
            creator,
            ctx(),
            "over-18",
            path.iter().map(|i| i.account().clone()).collect(),
        )
    }

    async fn verify(
        &self,
        claim: &SignedClaim,
        trusted_root: &Identity,
    ) -> Result<VerificationResult, ProtocolError> {
        self.verifier
            .verify(claim, trusted_root.account(), &VerifyOptions::default())
            .await
    }
}

fn accounts(ids: &[&Identity]) -> Vec<AccountId> {
    ids.iter().map(|i| i.account().clone()).collect()
}

fn by(attestor: &Identity, parent: &Identity) -> Attestor {
    Attestor::new(attestor.clone()).attested_by(parent.account().clone())
}

fn root_redirect(root: &Identity, next: &Identity) -> UpdateRequest {
    UpdateRequest::new(ctx(), EntityType::Root, root.account().clone())
        .redirect(RedirectTarget::Root(next.clone()))
}

// -- Plain walks --------------------------------------------------------------

#[tokio::test]
async fn leaf_attested_by_root_verifies() {
    let w = World::new();
    let (alice, erin) = (identity("alice"), identity("erin"));
    w.root(&alice).await;
    w.attest(EntityType::Leaf, &erin, &Attestor::new(alice.clone()))
        .await;

    let result = w.verify(&w.claim(&erin, &[&alice]), &alice).await.unwrap();
    assert_eq!(result.verified_trust_chain, accounts(&[&erin, &alice]));
    assert_eq!(&result.active_root_account, alice.account());
}

#[tokio::test]
async fn erin_through_three_intermediates_to_alice() {
    let w = World::new();
    let (alice, bob, charlie, david, erin) = (
        identity("alice"),
        identity("bob"),
        identity("charlie"),
        identity("david"),
        identity("erin"),
    );
    w.root(&alice).await;
    w.attest(EntityType::Intermediate, &bob, &Attestor::new(alice.clone()))
        .await;
    w.attest(EntityType::Intermediate, &charlie, &by(&bob, &alice))
        .await;
    w.attest(EntityType::Intermediate, &david, &by(&charlie, &bob))
        .await;
    w.attest(EntityType::Leaf, &erin, &by(&david, &charlie)).await;

    let claim = w.claim(&erin, &[&david, &charlie, &bob, &alice]);
    let result = w.verify(&claim, &alice).await.unwrap();
    assert_eq!(
        result.verified_trust_chain,
        accounts(&[&erin, &david, &charlie, &bob, &alice])
    );
    assert_eq!(&result.active_root_account, alice.account());
}

#[tokio::test]
async fn path_led_by_creator_collapses_to_creator() {
    let w = World::new();
    let (alice, erin) = (identity("alice"), identity("erin"));
    w.root(&alice).await;
    w.attest(EntityType::Leaf, &erin, &Attestor::new(alice.clone()))
        .await;
    w.raw(&erin, &erin, "001|l|a|0000-0000-0000-00000|");

    let err = w
        .verify(&w.claim(&erin, &[&erin, &alice]), &alice)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EndEntityNotRoot);
}

#[tokio::test]
async fn root_claim_with_empty_path_verifies() {
    let w = World::new();
    let alice = identity("alice");
    w.root(&alice).await;

    let result = w.verify(&w.claim(&alice, &[]), &alice).await.unwrap();
    assert_eq!(result.verified_trust_chain, accounts(&[&alice]));
}

#[tokio::test]
async fn one_ledger_read_per_visited_account() {
    let w = World::new();
    let (alice, bob, erin) = (identity("alice"), identity("bob"), identity("erin"));
    w.root(&alice).await;
    w.attest(EntityType::Intermediate, &bob, &Attestor::new(alice.clone()))
        .await;
    w.attest(EntityType::Leaf, &erin, &by(&bob, &alice)).await;

    let before = w.ledger.read_count();
    let result = w.verify(&w.claim(&erin, &[&bob, &alice]), &alice).await.unwrap();
    assert_eq!(w.ledger.read_count() - before, result.verified_trust_chain.len());
}

// -- Deprecation redirects ----------------------------------------------------

/// Bob (root) attests Charlie, who attests David, who attests Erin. Bob then
/// rotates to Alice.
#[tokio::test]
async fn erin_to_alice_through_deprecated_root() {
    let w = World::new();
    let [alice, bob, charlie, david, erin] =
        ["alice", "bob", "charlie", "david", "erin"].map(identity);
    w.root(&bob).await;
    w.attest(EntityType::Intermediate, &charlie, &Attestor::new(bob.clone()))
        .await;
    w.attest(EntityType::Intermediate, &david, &by(&charlie, &bob))
        .await;
    w.attest(EntityType::Leaf, &erin, &by(&david, &charlie)).await;
    w.lifecycle
        .update(&root_redirect(&bob, &alice), &Attestor::new(bob.clone()))
        .await
        .unwrap();

    let claim = w.claim(&erin, &[&david, &charlie, &bob]);
    let result = w.verify(&claim, &bob).await.unwrap();

    assert_eq!(
        result.verified_trust_chain,
        accounts(&[&erin, &david, &charlie, &bob, &alice])
    );
    assert_eq!(&result.active_root_account, alice.account());
}

#[tokio::test]
async fn redirected_intermediate_appears_in_chain() {
    let w = World::new();
    let [alice, bob, bob2, erin] = ["alice", "bob", "bob2", "erin"].map(identity);
    w.root(&alice).await;
    w.attest(EntityType::Intermediate, &bob, &Attestor::new(alice.clone()))
        .await;
    w.attest(EntityType::Leaf, &erin, &by(&bob, &alice)).await;
    let rotate = UpdateRequest::new(ctx(), EntityType::Intermediate, bob.account().clone())
        .redirect(RedirectTarget::Account(bob2.account().clone()));
    w.lifecycle
        .update(&rotate, &Attestor::new(alice.clone()))
        .await
        .unwrap();

    let result = w.verify(&w.claim(&erin, &[&bob, &alice]), &alice).await.unwrap();
    assert_eq!(
        result.verified_trust_chain,
        accounts(&[&erin, &bob, &bob2, &alice])
    );
    assert_eq!(&result.active_root_account, alice.account());
}

#[tokio::test]
async fn deprecated_creator_is_rejected() {
    let w = World::new();
    let [alice, erin, erin2] = ["alice", "erin", "erin2"].map(identity);
    w.root(&alice).await;
    w.attest(EntityType::Leaf, &erin, &Attestor::new(alice.clone()))
        .await;
    let rotate = UpdateRequest::new(ctx(), EntityType::Leaf, erin.account().clone())
        .redirect(RedirectTarget::Account(erin2.account().clone()));
    w.lifecycle
        .update(&rotate, &Attestor::new(alice.clone()))
        .await
        .unwrap();

    let err = w.verify(&w.claim(&erin, &[&alice]), &alice).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CreatorAccountDeprecated);

    let result = w.verify(&w.claim(&erin2, &[&alice]), &alice).await.unwrap();
    assert_eq!(result.verified_trust_chain, accounts(&[&erin2, &alice]));
}

/// A leaf under `roots[0]`, whose root record is redirected `hops` times.
async fn rotated_root_world(hops: usize) -> (World, Identity, Vec<Identity>) {
    let w = World::new();
    let erin = identity("erin");
    let roots: Vec<Identity> = (0..=hops).map(|i| identity(&format!("root-{i}"))).collect();
    w.root(&roots[0]).await;
    w.attest(EntityType::Leaf, &erin, &Attestor::new(roots[0].clone()))
        .await;
    for pair in roots.windows(2) {
        w.lifecycle
            .update(&root_redirect(&pair[0], &pair[1]), &Attestor::new(pair[0].clone()))
            .await
            .unwrap();
    }
    (w, erin, roots)
}

#[tokio::test]
async fn nineteen_and_twenty_redirects_are_followed() {
    for hops in [19, 20] {
        let (w, erin, roots) = rotated_root_world(hops).await;
        let result = w.verify(&w.claim(&erin, &[&roots[0]]), &roots[0]).await.unwrap();
        assert_eq!(result.verified_trust_chain.len(), hops + 2);
        assert_eq!(&result.active_root_account, roots[hops].account());
    }
}

#[tokio::test]
async fn twenty_one_redirects_are_too_many() {
    let (w, erin, roots) = rotated_root_world(21).await;
    let err = w
        .verify(&w.claim(&erin, &[&roots[0]]), &roots[0])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TooManyDeprecationHops);
}

#[tokio::test]
async fn type_change_inside_redirect_chain_is_mismatch() {
    let w = World::new();
    let [alice, alice2, erin] = ["alice", "alice2", "erin"].map(identity);
    w.raw(&erin, &alice, "001|l|a|0000-0000-0000-00000|");
    w.raw(
        &alice,
        &alice,
        &format!("001|r|d|{}|", alice2.account().suffix()),
    );
    w.raw(&alice2, &alice2, "001|i|a|0000-0000-0000-00000|");

    let err = w.verify(&w.claim(&erin, &[&alice]), &alice).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::EntityMismatch);
}

#[tokio::test]
async fn deprecated_without_redirect_is_invalid() {
    let w = World::new();
    let [alice, erin] = ["alice", "erin"].map(identity);
    w.raw(&erin, &alice, "001|l|a|0000-0000-0000-00000|");
    w.raw(&alice, &alice, "001|r|d|0000-0000-0000-00000|");

    let err = w.verify(&w.claim(&erin, &[&alice]), &alice).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidRedirectAccount);
}

// -- Positional rules ---------------------------------------------------------

#[tokio::test]
async fn leaf_in_middle_is_rejected() {
    let w = World::new();
    let [alice, frank, erin] = ["alice", "frank", "erin"].map(identity);
    w.raw(&erin, &frank, "001|l|a|0000-0000-0000-00000|");
    w.raw(&frank, &alice, "001|l|a|0000-0000-0000-00000|");
    w.raw(&alice, &alice, "001|r|a|0000-0000-0000-00000|");

    let err = w
        .verify(&w.claim(&erin, &[&frank, &alice]), &alice)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::LeafAttestorNotAllowed);
}

#[tokio::test]
async fn root_in_middle_is_rejected() {
    let w = World::new();
    let [alice, bob, erin] = ["alice", "bob", "erin"].map(identity);
    w.raw(&erin, &alice, "001|l|a|0000-0000-0000-00000|");
    w.raw(&alice, &bob, "001|r|a|0000-0000-0000-00000|");
    w.raw(&bob, &bob, "001|r|a|0000-0000-0000-00000|");

    let err = w
        .verify(&w.claim(&erin, &[&alice, &bob]), &bob)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RootEntityInMiddleOfPath);
}

#[tokio::test]
async fn path_ending_below_root_is_rejected() {
    let w = World::new();
    let [david, erin] = ["david", "erin"].map(identity);
    w.raw(&erin, &david, "001|l|a|0000-0000-0000-00000|");
    w.raw(&david, &david, "001|i|a|0000-0000-0000-00000|");

    let err = w.verify(&w.claim(&erin, &[&david]), &david).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::EndEntityNotRoot);
}

#[tokio::test]
async fn lone_leaf_is_not_a_root() {
    let w = World::new();
    let erin = identity("erin");
    w.raw(&erin, &erin, "001|l|a|0000-0000-0000-00000|");

    let err = w.verify(&w.claim(&erin, &[]), &erin).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::EndEntityNotRoot);
}

#[tokio::test]
async fn inactive_intermediate_is_rejected() {
    let w = World::new();
    let [alice, bob, erin] = ["alice", "bob", "erin"].map(identity);
    w.root(&alice).await;
    w.attest(EntityType::Intermediate, &bob, &Attestor::new(alice.clone()))
        .await;
    w.attest(EntityType::Leaf, &erin, &by(&bob, &alice)).await;
    let pause = UpdateRequest::new(ctx(), EntityType::Intermediate, bob.account().clone())
        .state(apx_core::EntityState::Inactive);
    w.lifecycle
        .update(&pause, &Attestor::new(alice.clone()))
        .await
        .unwrap();

    let err = w
        .verify(&w.claim(&erin, &[&bob, &alice]), &alice)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EntityInactive);
}

#[tokio::test]
async fn missing_link_is_context_not_found() {
    let w = World::new();
    let [alice, bob, erin] = ["alice", "bob", "erin"].map(identity);
    w.root(&alice).await;
    w.attest(EntityType::Leaf, &erin, &Attestor::new(alice.clone()))
        .await;

    let err = w
        .verify(&w.claim(&erin, &[&bob, &alice]), &alice)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AttestationContextNotFound);
}

#[tokio::test]
async fn untrusted_root_is_not_found() {
    let w = World::new();
    let [alice, mallory, erin] = ["alice", "mallory", "erin"].map(identity);
    w.root(&alice).await;
    w.attest(EntityType::Leaf, &erin, &Attestor::new(alice.clone()))
        .await;

    let err = w
        .verify(&w.claim(&erin, &[&alice]), &mallory)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TrustedRootNotFound);
}

// -- Signature ----------------------------------------------------------------

#[tokio::test]
async fn tampered_payload_is_invalid_signature() {
    let w = World::new();
    let [alice, erin] = ["alice", "erin"].map(identity);
    let mut claim = w.claim(&erin, &[&alice]);
    claim.payload = "over-21".into();

    let err = w.verify(&claim, &alice).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidSignature);
}

#[tokio::test]
async fn garbage_signature_is_invalid_signature() {
    let w = World::new();
    let [alice, erin] = ["alice", "erin"].map(identity);
    let mut claim = w.claim(&erin, &[&alice]);
    claim.signature = "not-a-token".into();

    let err = w.verify(&claim, &alice).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidSignature);
}

#[tokio::test]
async fn claim_signed_by_someone_else_is_wrong_creator() {
    let w = World::new();
    let [alice, erin, mallory] = ["alice", "erin", "mallory"].map(identity);
    let mut claim = w.claim(&mallory, &[&alice]);
    claim.creator_account = erin.account().clone();

    let err = w.verify(&claim, &alice).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::WrongCreatorAccount);
}

// -- Callbacks ----------------------------------------------------------------

#[tokio::test]
async fn claim_check_sees_signing_time_and_can_reject() {
    let w = World::new();
    let [alice, erin] = ["alice", "erin"].map(identity);
    w.root(&alice).await;
    w.attest(EntityType::Leaf, &erin, &Attestor::new(alice.clone()))
        .await;
    let claim = w.claim(&erin, &[&alice]);

    let before = Utc::now() - chrono::Duration::minutes(5);
    let fresh_only = move |_: &SignedClaim, created_at: DateTime<Utc>| {
        if created_at >= before {
            Ok(())
        } else {
            Err(Rejection::new("stale"))
        }
    };
    w.verifier
        .verify(
            &claim,
            alice.account(),
            &VerifyOptions::new().with_claim_check(fresh_only),
        )
        .await
        .unwrap();

    let reject_all = |_: &SignedClaim, _: DateTime<Utc>| -> Result<(), Rejection> {
        Err(Rejection::new("closed"))
    };
    let err = w
        .verifier
        .verify(
            &claim,
            alice.account(),
            &VerifyOptions::new().with_claim_check(reject_all),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ClaimCheckRejected);
    assert_eq!(err.description, "closed");
}

#[tokio::test]
async fn entity_check_sees_every_visited_record() {
    let w = World::new();
    let [alice, bob, erin] = ["alice", "bob", "erin"].map(identity);
    w.root(&alice).await;
    w.attest(EntityType::Intermediate, &bob, &Attestor::new(alice.clone()))
        .await;
    w.attest(EntityType::Leaf, &erin, &by(&bob, &alice)).await;
    let claim = w.claim(&erin, &[&bob, &alice]);

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let count = move |entity: &AttestationEntity| -> Result<(), Rejection> {
        assert_eq!(entity.version, "001");
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(())
    };
    w.verifier
        .verify(
            &claim,
            alice.account(),
            &VerifyOptions::new().with_entity_check(count),
        )
        .await
        .unwrap();
    assert_eq!(seen.load(Ordering::Relaxed), 3);

    let no_banks = |entity: &AttestationEntity| match entity.entity_type {
        EntityType::Intermediate => Err(Rejection::new(format!("{} not allowed", entity.account))),
        _ => Ok(()),
    };
    let err = w
        .verifier
        .verify(
            &claim,
            alice.account(),
            &VerifyOptions::new().with_entity_check(no_banks),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EntityCheckRejected);
}
