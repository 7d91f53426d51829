//! The redeem workflow.
//!
//! Redemption starts from nothing but an asset ID — possibly in a fresh
//! process, years after the mint. Everything else is recovered from the
//! ledger: the creation transaction's note yields the escrow program, the
//! program yields the conditions, and re-derivation plus the fingerprint
//! confirm that the asset's designated reserve really is the escrow those
//! conditions describe. Only after every check passes does the atomic swap
//! go out, followed by teardown (destroy the asset, close the escrow).

use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::{ProtocolConfig, MIN_TX_FEE};
use crate::error::WorkflowError;
use crate::escrow::{self, EscrowAuthority};
use crate::ledger::{AssetInfo, LedgerGateway};
use crate::token::{Fingerprint, MintMetadata, TokenParameters};
use crate::transaction::{assign_group, authorize_with_program, TransactionBuilder};

use super::signer::TransactionSigner;
use super::submit_and_confirm;

const STEP_FETCH: &str = "fetch-asset";
const STEP_RECOVER: &str = "recover-metadata";
const STEP_VERIFY_ESCROW: &str = "verify-escrow";
const STEP_VERIFY_OWNERSHIP: &str = "verify-ownership";
const STEP_AMOUNT: &str = "compute-amount";
const STEP_SWAP: &str = "swap";
const STEP_DESTROY: &str = "destroy";
const STEP_CLOSE: &str = "close-escrow";

/// Outcome of a successful redemption.
#[derive(Debug, Clone)]
pub struct RedeemReceipt {
    /// Amount paid to the redeemer by the swap, in motes. The close-out
    /// residual arrives on top of this.
    pub payout: u64,
    pub tx_ids: Vec<String>,
}

/// Everything recovered and verified about a note before mutating anything.
struct RecoveredNote {
    asset: AssetInfo,
    metadata: MintMetadata,
    authority: EscrowAuthority,
}

/// Drives the redemption choreography against a ledger gateway.
pub struct RedeemOrchestrator {
    gateway: Arc<dyn LedgerGateway>,
    signer: Arc<dyn TransactionSigner>,
    config: ProtocolConfig,
}

impl RedeemOrchestrator {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        signer: Arc<dyn TransactionSigner>,
        config: ProtocolConfig,
    ) -> Self {
        Self {
            gateway,
            signer,
            config,
        }
    }

    /// Redeems a note held by the signer's account.
    #[instrument(skip_all, fields(run_id = %Uuid::new_v4(), asset_id))]
    pub async fn redeem(&self, asset_id: u64) -> Result<RedeemReceipt, WorkflowError> {
        let redeemer = self.signer.address();
        let gateway = self.gateway.as_ref();
        let timeout = self.config.confirm_timeout;
        let policy = self.config.redemption_policy;

        let recovered = self.recover_and_verify(asset_id).await?;
        let escrow = &recovered.authority;

        // Ownership: the redeemer must hold exactly the single unit.
        let redeemer_info = gateway
            .account_info(&redeemer)
            .await
            .map_err(|e| WorkflowError::from_gateway(STEP_VERIFY_OWNERSHIP, e))?;
        match redeemer_info.holding(asset_id) {
            Some(1) => {}
            held => {
                return Err(WorkflowError::verification(
                    STEP_VERIFY_OWNERSHIP,
                    format!("redeemer holds {} units, expected 1", held.unwrap_or(0)),
                ));
            }
        }

        // Payout: the note's stored amount, or balance inspection when the
        // note predates that field.
        let escrow_info = gateway
            .account_info(&escrow.address)
            .await
            .map_err(|e| WorkflowError::from_gateway(STEP_AMOUNT, e))?;
        let payout = match recovered.metadata.locked_amount {
            Some(amount) => amount,
            None => {
                let fallback = escrow_info
                    .balance
                    .saturating_sub(policy.min_reserve)
                    .saturating_sub(policy.fee_buffer);
                warn!(
                    fallback,
                    balance = escrow_info.balance,
                    "note carries no locked amount, falling back to balance inspection"
                );
                fallback
            }
        };
        if payout == 0 {
            return Err(WorkflowError::insufficient_funds(
                STEP_AMOUNT,
                "computed payout is zero",
            ));
        }
        let required = payout + policy.min_reserve + policy.fee_buffer;
        if escrow_info.balance < required {
            return Err(WorkflowError::insufficient_funds(
                STEP_AMOUNT,
                format!(
                    "escrow balance {} cannot cover payout {} plus reserve and fees",
                    escrow_info.balance, payout
                ),
            ));
        }
        info!(payout, "payout computed");

        // The atomic swap: note back to escrow, payout to redeemer. The
        // group commits or fails as one — no state where the redeemer has
        // given up the note without being paid.
        let mut legs = vec![
            TransactionBuilder::asset_transfer(redeemer, asset_id, escrow.address, 1)
                .fee(MIN_TX_FEE)
                .sequence(redeemer_info.sequence + 1)
                .build(),
            TransactionBuilder::payment(escrow.address, redeemer, payout)
                .fee(MIN_TX_FEE)
                .sequence(escrow_info.sequence + 1)
                .build(),
        ];
        assign_group(&mut legs);
        self.signer
            .sign(&mut legs[0])
            .await
            .map_err(|e| WorkflowError::validation(STEP_SWAP, e.to_string()))?;
        authorize_with_program(&mut legs[1], &escrow.program);

        let mut tx_ids = submit_and_confirm(gateway, STEP_SWAP, &legs, timeout).await?;
        info!("swap committed");

        tx_ids.extend(
            self.teardown(asset_id, escrow, escrow_info.sequence + 2)
                .await?,
        );
        info!(asset_id, "note redeemed and escrow decommissioned");

        Ok(RedeemReceipt { payout, tx_ids })
    }

    /// Finishes an interrupted redemption: the swap landed (the escrow
    /// holds the note again) but destroy and close-out never ran. Performs
    /// only those two steps.
    #[instrument(skip_all, fields(run_id = %Uuid::new_v4(), asset_id))]
    pub async fn resume(&self, asset_id: u64) -> Result<Vec<String>, WorkflowError> {
        let gateway = self.gateway.as_ref();
        let recovered = self.recover_and_verify(asset_id).await?;
        let escrow = &recovered.authority;

        let escrow_info = gateway
            .account_info(&escrow.address)
            .await
            .map_err(|e| WorkflowError::from_gateway(STEP_VERIFY_OWNERSHIP, e))?;
        if escrow_info.holding(asset_id) != Some(recovered.asset.total) {
            return Err(WorkflowError::validation(
                STEP_VERIFY_OWNERSHIP,
                "escrow does not hold the full supply; nothing to resume",
            ));
        }

        let ids = self
            .teardown(asset_id, escrow, escrow_info.sequence + 1)
            .await?;
        info!(asset_id, "interrupted redemption completed");
        Ok(ids)
    }

    /// Steps 7–8: destroy the asset, close the escrow to the redeemer.
    async fn teardown(
        &self,
        asset_id: u64,
        escrow: &EscrowAuthority,
        escrow_sequence: u64,
    ) -> Result<Vec<String>, WorkflowError> {
        let gateway = self.gateway.as_ref();
        let timeout = self.config.confirm_timeout;
        let redeemer = self.signer.address();
        let mut ids = Vec::new();

        let mut destroy = TransactionBuilder::asset_destroy(escrow.address, asset_id)
            .fee(MIN_TX_FEE)
            .sequence(escrow_sequence)
            .build();
        authorize_with_program(&mut destroy, &escrow.program);
        ids.extend(submit_and_confirm(gateway, STEP_DESTROY, &[destroy], timeout).await?);

        let mut close = TransactionBuilder::close_out(escrow.address, redeemer)
            .fee(MIN_TX_FEE)
            .sequence(escrow_sequence + 1)
            .build();
        authorize_with_program(&mut close, &escrow.program);
        ids.extend(submit_and_confirm(gateway, STEP_CLOSE, &[close], timeout).await?);

        Ok(ids)
    }

    /// Steps 1–3: fetch the asset, recover the mint metadata, and verify
    /// the escrow. Read-only; fails closed on anything it cannot confirm.
    async fn recover_and_verify(&self, asset_id: u64) -> Result<RecoveredNote, WorkflowError> {
        let gateway = self.gateway.as_ref();

        let asset = gateway
            .asset_info(asset_id)
            .await
            .map_err(|e| WorkflowError::from_gateway(STEP_FETCH, e))?;
        if asset.total != 1 || asset.decimals != 0 {
            return Err(WorkflowError::validation(
                STEP_FETCH,
                "asset is not a single indivisible unit",
            ));
        }

        // The creation transaction's note is the only persistent record of
        // the escrow program. No note, no redemption.
        let record = gateway
            .transaction(&asset.creation_tx_id)
            .await
            .map_err(|e| WorkflowError::from_gateway(STEP_RECOVER, e))?;
        let note_bytes = record.transaction.note.as_deref().ok_or_else(|| {
            WorkflowError::verification(STEP_RECOVER, "creation transaction carries no note")
        })?;
        let metadata = MintMetadata::decode(note_bytes)
            .map_err(|e| WorkflowError::verification(STEP_RECOVER, e.to_string()))?;
        let program = metadata
            .program_bytes()
            .map_err(|e| WorkflowError::verification(STEP_RECOVER, e.to_string()))?;
        let authority = EscrowAuthority::from_program(&program)
            .map_err(|e| WorkflowError::verification(STEP_RECOVER, e.to_string()))?;
        let conditions = authority.conditions;

        if metadata.nonce != conditions.nonce {
            return Err(WorkflowError::verification(
                STEP_RECOVER,
                "note nonce disagrees with escrow program",
            ));
        }
        if let Some(locked) = metadata.locked_amount {
            if locked != conditions.min_payout {
                return Err(WorkflowError::verification(
                    STEP_RECOVER,
                    "note locked amount disagrees with escrow program",
                ));
            }
        }

        // Independent re-derivation must reproduce the stored program.
        let derived = escrow::derive(conditions.creator, conditions.nonce, conditions.min_payout);
        if derived.program != authority.program {
            return Err(WorkflowError::verification(
                STEP_RECOVER,
                "re-derived program differs from the one stored in the note",
            ));
        }

        // The core anti-forgery check: the asset's reserve must be the
        // recomputed escrow address. A lookalike asset whose note points at
        // an escrow it does not control fails here.
        if asset.reserve != Some(authority.address) {
            return Err(WorkflowError::verification(
                STEP_VERIFY_ESCROW,
                "asset reserve does not match recomputed escrow address",
            ));
        }

        // Fingerprint: recompute from on-chain fields and compare against
        // both embedding channels (note and metadata hash).
        let params = TokenParameters::new(
            asset.name.clone(),
            asset.unit.clone(),
            conditions.creator,
            conditions.min_payout,
            conditions.nonce,
        )
        .map_err(|e| WorkflowError::verification(STEP_VERIFY_ESCROW, e.to_string()))?;
        let embedded = metadata
            .fingerprint()
            .map_err(|e| WorkflowError::verification(STEP_VERIFY_ESCROW, e.to_string()))?;
        if !Fingerprint::verify(&embedded, &params, &authority.program) {
            return Err(WorkflowError::verification(
                STEP_VERIFY_ESCROW,
                "fingerprint does not verify against recovered parameters",
            ));
        }
        if asset.metadata_hash != Some(*embedded.as_bytes()) {
            return Err(WorkflowError::verification(
                STEP_VERIFY_ESCROW,
                "asset metadata hash disagrees with note fingerprint",
            ));
        }

        info!(escrow = %authority.address, "escrow verified");
        Ok(RecoveredNote {
            asset,
            metadata,
            authority,
        })
    }
}
