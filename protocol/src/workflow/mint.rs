//! The mint workflow.
//!
//! Steps, in order: validate the request, derive the escrow, fund it,
//! have the escrow create the note asset (fingerprint and metadata embedded
//! in the same transaction), opt the creator in, transfer the single unit
//! to the creator, and finally verify the on-chain result against the
//! locally derived expectations. Success is reported only after that last
//! verification passes.

use rand::Rng;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::address::Address;
use crate::config::{ProtocolConfig, MIN_TX_FEE};
use crate::error::WorkflowError;
use crate::escrow::{self, EscrowAuthority};
use crate::ledger::LedgerGateway;
use crate::token::{Fingerprint, MintMetadata, TokenParameters};
use crate::transaction::{
    authorize_with_program, AssetCreateParams, TransactionBuilder,
};

use super::signer::TransactionSigner;
use super::{next_sequence, submit_and_confirm};

const STEP_VALIDATE: &str = "validate";
const STEP_FUND: &str = "fund-escrow";
const STEP_CREATE: &str = "create-asset";
const STEP_OPT_IN: &str = "opt-in";
const STEP_TRANSFER: &str = "transfer";
const STEP_VERIFY: &str = "verify";

/// Inputs to a mint. The creator is whoever the signer controls.
#[derive(Debug, Clone)]
pub struct MintRequest {
    pub name: String,
    pub unit: String,
    /// Value to lock behind the note, in motes.
    pub locked_amount: u64,
}

/// Outcome of a successful mint.
#[derive(Debug, Clone)]
pub struct MintReceipt {
    pub asset_id: u64,
    pub escrow_address: Address,
    pub fingerprint: Fingerprint,
    pub nonce: u64,
    /// Total sent to the escrow: locked amount plus reserve and fee buffer.
    pub funded_amount: u64,
    pub tx_ids: Vec<String>,
}

/// Drives the mint choreography against a ledger gateway.
pub struct MintOrchestrator {
    gateway: Arc<dyn LedgerGateway>,
    signer: Arc<dyn TransactionSigner>,
    config: ProtocolConfig,
}

impl MintOrchestrator {
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

    /// Mints a value-locked note and returns its receipt.
    #[instrument(skip_all, fields(run_id = %Uuid::new_v4(), name = %request.name))]
    pub async fn mint(&self, request: MintRequest) -> Result<MintReceipt, WorkflowError> {
        let creator = self.signer.address();
        let gateway = self.gateway.as_ref();
        let timeout = self.config.confirm_timeout;
        let mut tx_ids = Vec::new();

        // Validate and derive everything before touching the ledger.
        let nonce: u64 = rand::rngs::OsRng.gen();
        let params = TokenParameters::new(
            request.name.clone(),
            request.unit.clone(),
            creator,
            request.locked_amount,
            nonce,
        )
        .map_err(|e| WorkflowError::validation(STEP_VALIDATE, e.to_string()))?;

        let authority = escrow::derive(creator, nonce, params.locked_amount);
        let fingerprint = Fingerprint::compute(&params, &authority.program);
        let note = MintMetadata::for_mint(nonce, params.locked_amount, &authority, &fingerprint)
            .encode()
            .map_err(|e| WorkflowError::validation(STEP_VALIDATE, e.to_string()))?;

        info!(escrow = %authority.address, nonce, "derived escrow authority");

        // Fund the escrow.
        let funded_amount = self.config.escrow_funding(params.locked_amount);
        let creator_info = gateway
            .account_info(&creator)
            .await
            .map_err(|e| WorkflowError::from_gateway(STEP_FUND, e))?;
        if creator_info.balance < funded_amount + MIN_TX_FEE {
            return Err(WorkflowError::insufficient_funds(
                STEP_FUND,
                format!(
                    "creator balance {} cannot cover funding {} plus fee",
                    creator_info.balance, funded_amount
                ),
            ));
        }
        let mut funding = TransactionBuilder::payment(creator, authority.address, funded_amount)
            .fee(MIN_TX_FEE)
            .sequence(creator_info.sequence + 1)
            .build();
        self.signer
            .sign(&mut funding)
            .await
            .map_err(|e| WorkflowError::validation(STEP_FUND, e.to_string()))?;
        tx_ids.extend(submit_and_confirm(gateway, STEP_FUND, &[funding], timeout).await?);
        info!(amount = funded_amount, "escrow funded");

        // The escrow creates the asset, carrying fingerprint and metadata.
        let escrow_seq = next_sequence(gateway, STEP_CREATE, &authority.address).await?;
        let mut create = TransactionBuilder::asset_create(
            authority.address,
            AssetCreateParams {
                name: params.name.clone(),
                unit: params.unit.clone(),
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
        .sequence(escrow_seq)
        .note(note)
        .build();
        authorize_with_program(&mut create, &authority.program);
        let create_ids = submit_and_confirm(gateway, STEP_CREATE, &[create], timeout).await?;

        let asset_id = gateway
            .transaction(&create_ids[0])
            .await
            .map_err(|e| WorkflowError::from_gateway(STEP_CREATE, e))?
            .created_asset_id
            .ok_or_else(|| {
                WorkflowError::verification(STEP_CREATE, "creation confirmed but no asset ID")
            })?;
        tx_ids.extend(create_ids);
        info!(asset_id, "asset created with embedded fingerprint");

        // Creator opts in, then the escrow hands the unit over.
        let mut opt_in = TransactionBuilder::opt_in(creator, asset_id)
            .fee(MIN_TX_FEE)
            .sequence(creator_info.sequence + 2)
            .build();
        self.signer
            .sign(&mut opt_in)
            .await
            .map_err(|e| WorkflowError::validation(STEP_OPT_IN, e.to_string()))?;
        tx_ids.extend(submit_and_confirm(gateway, STEP_OPT_IN, &[opt_in], timeout).await?);

        let mut transfer =
            TransactionBuilder::asset_transfer(authority.address, asset_id, creator, 1)
                .fee(MIN_TX_FEE)
                .sequence(escrow_seq + 1)
                .build();
        authorize_with_program(&mut transfer, &authority.program);
        tx_ids.extend(submit_and_confirm(gateway, STEP_TRANSFER, &[transfer], timeout).await?);
        info!("note transferred to creator");

        // Trust nothing: re-read the chain and compare to expectations.
        self.verify(asset_id, &params, &authority, &fingerprint)
            .await?;
        info!(asset_id, fingerprint = %fingerprint, "mint verified");

        Ok(MintReceipt {
            asset_id,
            escrow_address: authority.address,
            fingerprint,
            nonce,
            funded_amount,
            tx_ids,
        })
    }

    /// Post-mint verification: the on-chain asset must match what we meant
    /// to mint, field for field.
    async fn verify(
        &self,
        asset_id: u64,
        params: &TokenParameters,
        authority: &EscrowAuthority,
        fingerprint: &Fingerprint,
    ) -> Result<(), WorkflowError> {
        let gateway = self.gateway.as_ref();
        let asset = gateway
            .asset_info(asset_id)
            .await
            .map_err(|e| WorkflowError::from_gateway(STEP_VERIFY, e))?;

        if asset.reserve != Some(authority.address) {
            return Err(WorkflowError::verification(
                STEP_VERIFY,
                "asset reserve does not match derived escrow address",
            ));
        }
        if asset.metadata_hash != Some(*fingerprint.as_bytes()) {
            return Err(WorkflowError::verification(
                STEP_VERIFY,
                "asset metadata hash does not match computed fingerprint",
            ));
        }

        let record = gateway
            .transaction(&asset.creation_tx_id)
            .await
            .map_err(|e| WorkflowError::from_gateway(STEP_VERIFY, e))?;
        let note_bytes = record.transaction.note.as_deref().ok_or_else(|| {
            WorkflowError::verification(STEP_VERIFY, "creation transaction carries no note")
        })?;
        let metadata = MintMetadata::decode(note_bytes)
            .map_err(|e| WorkflowError::verification(STEP_VERIFY, e.to_string()))?;
        let embedded = metadata
            .fingerprint()
            .map_err(|e| WorkflowError::verification(STEP_VERIFY, e.to_string()))?;
        if !Fingerprint::verify(&embedded, params, &authority.program) {
            return Err(WorkflowError::verification(
                STEP_VERIFY,
                "embedded fingerprint does not verify against parameters",
            ));
        }

        let holder = gateway
            .account_info(&params.creator)
            .await
            .map_err(|e| WorkflowError::from_gateway(STEP_VERIFY, e))?;
        if holder.holding(asset_id) != Some(1) {
            return Err(WorkflowError::verification(
                STEP_VERIFY,
                "creator does not hold the minted unit",
            ));
        }
        Ok(())
    }
}
