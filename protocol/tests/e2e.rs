//! End-to-end lifecycle tests against the in-memory sandbox ledger.

use std::sync::Arc;

use vaultnote_protocol::address::Address;
use vaultnote_protocol::config::{ProtocolConfig, MIN_TX_FEE};
use vaultnote_protocol::crypto::keys::VaultKeypair;
use vaultnote_protocol::error::WorkflowError;
use vaultnote_protocol::escrow;
use vaultnote_protocol::ledger::{GatewayError, InMemoryLedger, LedgerGateway};
use vaultnote_protocol::token::{Fingerprint, MintMetadata, TokenParameters};
use vaultnote_protocol::transaction::{
    assign_group, authorize_with_program, sign_transaction, AssetCreateParams, TransactionBuilder,
};
use vaultnote_protocol::workflow::{KeypairSigner, MintOrchestrator, MintRequest, RedeemOrchestrator};

const LOCKED: u64 = 5_000_000;

struct Harness {
    ledger: Arc<InMemoryLedger>,
    creator_kp: VaultKeypair,
    creator: Address,
    config: ProtocolConfig,
}

impl Harness {
    fn new() -> Self {
        let ledger = Arc::new(InMemoryLedger::new());
        let creator_kp = VaultKeypair::generate();
        let creator = Address::from_public_key(&creator_kp.public_key());
        ledger.fund(creator, 10_000_000);
        Self {
            ledger,
            creator_kp,
            creator,
            config: ProtocolConfig::default(),
        }
    }

    fn minter(&self) -> MintOrchestrator {
        MintOrchestrator::new(
            self.ledger.clone(),
            Arc::new(KeypairSigner::new(self.creator_kp.clone())),
            self.config.clone(),
        )
    }

    fn redeemer_for(&self, keypair: VaultKeypair) -> RedeemOrchestrator {
        RedeemOrchestrator::new(
            self.ledger.clone(),
            Arc::new(KeypairSigner::new(keypair)),
            self.config.clone(),
        )
    }

    async fn mint_ticket(&self) -> vaultnote_protocol::workflow::MintReceipt {
        self.minter()
            .mint(MintRequest {
                name: "Ticket".into(),
                unit: "TCK".into(),
                locked_amount: LOCKED,
            })
            .await
            .expect("mint should succeed")
    }
}

#[tokio::test]
async fn mint_then_redeem_round_trip() {
    let h = Harness::new();
    let receipt = h.mint_ticket().await;

    // Escrow funded with locked amount plus reserve and fee buffer.
    assert_eq!(receipt.funded_amount, h.config.escrow_funding(LOCKED));

    // The on-chain asset carries the escrow as reserve and the fingerprint
    // as metadata hash.
    let asset = h.ledger.asset_info(receipt.asset_id).await.unwrap();
    assert_eq!(asset.reserve, Some(receipt.escrow_address));
    assert_eq!(asset.metadata_hash, Some(*receipt.fingerprint.as_bytes()));
    assert_eq!(asset.total, 1);
    assert_eq!(asset.decimals, 0);

    let creator_info = h.ledger.account_info(&h.creator).await.unwrap();
    assert_eq!(creator_info.holding(receipt.asset_id), Some(1));

    // Redeem as the holder.
    let redeem = h.redeemer_for(h.creator_kp.clone());
    let outcome = redeem.redeem(receipt.asset_id).await.unwrap();
    assert_eq!(outcome.payout, LOCKED);

    // Asset destroyed, escrow closed.
    assert!(matches!(
        h.ledger.asset_info(receipt.asset_id).await,
        Err(GatewayError::NotFound { .. })
    ));
    assert!(matches!(
        h.ledger.account_info(&receipt.escrow_address).await,
        Err(GatewayError::NotFound { .. })
    ));

    // Full accounting: the creator ends up down only the fees (mint
    // funding fee, opt-in, swap leg) and gets the locked amount plus the
    // escrow's post-teardown residual back.
    let final_info = h.ledger.account_info(&h.creator).await.unwrap();
    assert_eq!(final_info.balance, 9_992_000);
    assert!(final_info.holdings.is_empty());
}

#[tokio::test]
async fn redeem_by_non_holder_fails_before_any_submission() {
    let h = Harness::new();
    let receipt = h.mint_ticket().await;
    let escrow_before = h
        .ledger
        .account_info(&receipt.escrow_address)
        .await
        .unwrap();

    let mallory_kp = VaultKeypair::generate();
    let mallory = Address::from_public_key(&mallory_kp.public_key());
    h.ledger.fund(mallory, 1_000_000);

    let err = h
        .redeemer_for(mallory_kp)
        .redeem(receipt.asset_id)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Verification { .. }));
    assert_eq!(err.step(), "verify-ownership");

    // Nothing moved: the rightful holder keeps the note, the escrow keeps
    // its balance, and the escrow never signed anything new.
    let creator_info = h.ledger.account_info(&h.creator).await.unwrap();
    assert_eq!(creator_info.holding(receipt.asset_id), Some(1));
    let escrow_after = h
        .ledger
        .account_info(&receipt.escrow_address)
        .await
        .unwrap();
    assert_eq!(escrow_after, escrow_before);
}

#[tokio::test]
async fn forged_reserve_fails_escrow_verification() {
    let h = Harness::new();

    // An attacker mints a lookalike asset under their own key: the note
    // carries a perfectly valid escrow program, but the asset's reserve is
    // the attacker, not the address that program hashes to.
    let attacker_kp = VaultKeypair::generate();
    let attacker = Address::from_public_key(&attacker_kp.public_key());
    h.ledger.fund(attacker, 1_000_000);

    let params = TokenParameters::new("Ticket", "TCK", attacker, LOCKED, 99).unwrap();
    let authority = escrow::derive(attacker, 99, LOCKED);
    let fingerprint = Fingerprint::compute(&params, &authority.program);
    let note = MintMetadata::for_mint(99, LOCKED, &authority, &fingerprint)
        .encode()
        .unwrap();

    let mut create = TransactionBuilder::asset_create(
        attacker,
        AssetCreateParams {
            name: "Ticket".into(),
            unit: "TCK".into(),
            total: 1,
            decimals: 0,
            manager: Some(attacker),
            reserve: Some(attacker),
            freeze: None,
            clawback: None,
            metadata_hash: Some(*fingerprint.as_bytes()),
        },
    )
    .fee(MIN_TX_FEE)
    .sequence(1)
    .note(note)
    .build();
    sign_transaction(&mut create, &attacker_kp);
    let ids = h.ledger.submit(&[create]).await.unwrap();
    let asset_id = h
        .ledger
        .transaction(&ids[0])
        .await
        .unwrap()
        .created_asset_id
        .unwrap();

    let err = h
        .redeemer_for(attacker_kp)
        .redeem(asset_id)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Verification { .. }));
    assert_eq!(err.step(), "verify-escrow");
}

#[tokio::test]
async fn underpaying_swap_is_rejected_atomically() {
    let h = Harness::new();
    let receipt = h.mint_ticket().await;

    let creator_before = h.ledger.account_info(&h.creator).await.unwrap();
    let escrow_before = h
        .ledger
        .account_info(&receipt.escrow_address)
        .await
        .unwrap();

    // Hand-craft a swap whose payout leg underpays; the escrow program
    // refuses it, and the group must leave no trace — including the first
    // leg that was otherwise valid.
    let authority = escrow::derive(h.creator, receipt.nonce, LOCKED);
    let mut legs = vec![
        TransactionBuilder::asset_transfer(h.creator, receipt.asset_id, authority.address, 1)
            .fee(MIN_TX_FEE)
            .sequence(creator_before.sequence + 1)
            .build(),
        TransactionBuilder::payment(authority.address, h.creator, LOCKED - 1)
            .fee(MIN_TX_FEE)
            .sequence(escrow_before.sequence + 1)
            .build(),
    ];
    assign_group(&mut legs);
    sign_transaction(&mut legs[0], &h.creator_kp);
    authorize_with_program(&mut legs[1], &authority.program);

    assert!(matches!(
        h.ledger.submit(&legs).await,
        Err(GatewayError::Rejected { .. })
    ));

    let creator_after = h.ledger.account_info(&h.creator).await.unwrap();
    assert_eq!(creator_after, creator_before);
    let escrow_after = h
        .ledger
        .account_info(&receipt.escrow_address)
        .await
        .unwrap();
    assert_eq!(escrow_after, escrow_before);
}

#[tokio::test]
async fn legacy_note_without_locked_amount_falls_back_to_balance() {
    let h = Harness::new();
    let locked = 2_000_000u64;
    let nonce = 7u64;

    // Mint by hand the way an early release did, omitting locked_amount
    // from the note.
    let params = TokenParameters::new("Voucher", "VCH", h.creator, locked, nonce).unwrap();
    let authority = escrow::derive(h.creator, nonce, locked);
    let fingerprint = Fingerprint::compute(&params, &authority.program);
    let mut metadata = MintMetadata::for_mint(nonce, locked, &authority, &fingerprint);
    metadata.locked_amount = None;
    let note = metadata.encode().unwrap();

    let mut funding = TransactionBuilder::payment(
        h.creator,
        authority.address,
        h.config.escrow_funding(locked),
    )
    .fee(MIN_TX_FEE)
    .sequence(1)
    .build();
    sign_transaction(&mut funding, &h.creator_kp);
    h.ledger.submit(&[funding]).await.unwrap();

    let mut create = TransactionBuilder::asset_create(
        authority.address,
        AssetCreateParams {
            name: "Voucher".into(),
            unit: "VCH".into(),
            total: 1,
            decimals: 0,
            manager: Some(authority.address),
            reserve: Some(authority.address),
            freeze: None,
            clawback: None,
            metadata_hash: Some(*fingerprint.as_bytes()),
        },
    )
    .fee(MIN_TX_FEE)
    .sequence(1)
    .note(note)
    .build();
    authorize_with_program(&mut create, &authority.program);
    let ids = h.ledger.submit(&[create]).await.unwrap();
    let asset_id = h
        .ledger
        .transaction(&ids[0])
        .await
        .unwrap()
        .created_asset_id
        .unwrap();

    let mut opt_in = TransactionBuilder::opt_in(h.creator, asset_id)
        .fee(MIN_TX_FEE)
        .sequence(2)
        .build();
    sign_transaction(&mut opt_in, &h.creator_kp);
    h.ledger.submit(&[opt_in]).await.unwrap();

    let mut hand_off = TransactionBuilder::asset_transfer(authority.address, asset_id, h.creator, 1)
        .fee(MIN_TX_FEE)
        .sequence(2)
        .build();
    authorize_with_program(&mut hand_off, &authority.program);
    h.ledger.submit(&[hand_off]).await.unwrap();

    // The two payout computation paths must agree: the balance fallback
    // recovers exactly the locked amount.
    let outcome = h
        .redeemer_for(h.creator_kp.clone())
        .redeem(asset_id)
        .await
        .unwrap();
    assert_eq!(outcome.payout, locked);

    assert!(matches!(
        h.ledger.asset_info(asset_id).await,
        Err(GatewayError::NotFound { .. })
    ));
    assert!(matches!(
        h.ledger.account_info(&authority.address).await,
        Err(GatewayError::NotFound { .. })
    ));
}

#[tokio::test]
async fn resume_completes_an_interrupted_redemption() {
    let h = Harness::new();
    let receipt = h.mint_ticket().await;
    let authority = escrow::derive(h.creator, receipt.nonce, LOCKED);

    // Run the swap by hand, then stop — as if the process died before
    // teardown.
    let creator_info = h.ledger.account_info(&h.creator).await.unwrap();
    let escrow_info = h
        .ledger
        .account_info(&receipt.escrow_address)
        .await
        .unwrap();
    let mut legs = vec![
        TransactionBuilder::asset_transfer(h.creator, receipt.asset_id, authority.address, 1)
            .fee(MIN_TX_FEE)
            .sequence(creator_info.sequence + 1)
            .build(),
        TransactionBuilder::payment(authority.address, h.creator, LOCKED)
            .fee(MIN_TX_FEE)
            .sequence(escrow_info.sequence + 1)
            .build(),
    ];
    assign_group(&mut legs);
    sign_transaction(&mut legs[0], &h.creator_kp);
    authorize_with_program(&mut legs[1], &authority.program);
    h.ledger.submit(&legs).await.unwrap();

    // A fresh orchestrator, knowing only the asset ID, finishes the job.
    let redeem = h.redeemer_for(h.creator_kp.clone());
    let ids = redeem.resume(receipt.asset_id).await.unwrap();
    assert_eq!(ids.len(), 2);

    assert!(matches!(
        h.ledger.asset_info(receipt.asset_id).await,
        Err(GatewayError::NotFound { .. })
    ));
    assert!(matches!(
        h.ledger.account_info(&receipt.escrow_address).await,
        Err(GatewayError::NotFound { .. })
    ));
}

#[tokio::test]
async fn resume_refuses_when_swap_never_happened() {
    let h = Harness::new();
    let receipt = h.mint_ticket().await;

    let err = h
        .redeemer_for(h.creator_kp.clone())
        .resume(receipt.asset_id)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation { .. }));

    // The note is untouched.
    let creator_info = h.ledger.account_info(&h.creator).await.unwrap();
    assert_eq!(creator_info.holding(receipt.asset_id), Some(1));
}

#[tokio::test]
async fn mint_fails_fast_on_insufficient_creator_balance() {
    let ledger = Arc::new(InMemoryLedger::new());
    let kp = VaultKeypair::generate();
    let creator = Address::from_public_key(&kp.public_key());
    ledger.fund(creator, 1_000_000);

    let minter = MintOrchestrator::new(
        ledger.clone(),
        Arc::new(KeypairSigner::new(kp)),
        ProtocolConfig::default(),
    );
    let err = minter
        .mint(MintRequest {
            name: "Ticket".into(),
            unit: "TCK".into(),
            locked_amount: LOCKED,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InsufficientFunds { .. }));
    assert_eq!(err.step(), "fund-escrow");

    // Balance untouched: the check happens before any submission.
    assert_eq!(ledger.account_info(&creator).await.unwrap().balance, 1_000_000);
}

#[tokio::test]
async fn mint_rejects_invalid_parameters() {
    let h = Harness::new();
    let err = h
        .minter()
        .mint(MintRequest {
            name: "".into(),
            unit: "TCK".into(),
            locked_amount: LOCKED,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation { .. }));
    assert_eq!(err.step(), "validate");
}
