//! Mint and redeem orchestration.
//!
//! The orchestrators own the choreography; everything they know about the
//! outside world comes through [`crate::ledger::LedgerGateway`] and
//! [`signer::TransactionSigner`]. Escrow transactions are authorized by
//! attaching the escrow program — no signer is ever asked to produce an
//! escrow signature, because no escrow key exists.

pub mod mint;
pub mod redeem;
pub mod signer;

pub use mint::{MintOrchestrator, MintReceipt, MintRequest};
pub use redeem::{RedeemOrchestrator, RedeemReceipt};
pub use signer::{KeypairSigner, SignerError, TransactionSigner};

use futures::future::try_join_all;
use std::time::Duration;
use tracing::debug;

use crate::error::WorkflowError;
use crate::ledger::LedgerGateway;
use crate::transaction::Transaction;

/// Submits transactions and waits for every member to confirm.
pub(crate) async fn submit_and_confirm(
    gateway: &dyn LedgerGateway,
    step: &'static str,
    txs: &[Transaction],
    timeout: Duration,
) -> Result<Vec<String>, WorkflowError> {
    let ids = gateway
        .submit(txs)
        .await
        .map_err(|e| WorkflowError::from_gateway(step, e))?;
    try_join_all(
        ids.iter()
            .map(|id| gateway.wait_for_confirmation(id, timeout)),
    )
    .await
    .map_err(|e| WorkflowError::from_gateway(step, e))?;
    debug!(step, count = ids.len(), "confirmed");
    Ok(ids)
}

/// Next sequence number for an account; fresh accounts start at 1.
pub(crate) async fn next_sequence(
    gateway: &dyn LedgerGateway,
    step: &'static str,
    address: &crate::address::Address,
) -> Result<u64, WorkflowError> {
    match gateway.account_info(address).await {
        Ok(info) => Ok(info.sequence + 1),
        Err(crate::ledger::GatewayError::NotFound { .. }) => Ok(1),
        Err(e) => Err(WorkflowError::from_gateway(step, e)),
    }
}
