//! The ledger gateway contract.
//!
//! Workflows never talk to a ledger directly; they go through this trait.
//! Tests and the CLI use [`super::InMemoryLedger`]; a production deployment
//! would put a network client behind the same trait.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::address::Address;
use crate::transaction::Transaction;

use super::types::{AccountInfo, AssetInfo, TransactionRecord};

/// Failures surfaced by a ledger gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The ledger evaluated the submission and refused it. Not retryable
    /// without changing the transaction.
    #[error("submission rejected: {reason}")]
    Rejected { reason: String },

    /// Confirmation did not arrive within the deadline. The transaction
    /// may still land later.
    #[error("timed out waiting for confirmation of {tx_id}")]
    Timeout { tx_id: String },

    /// The queried entity does not exist on the ledger.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Transport-level failure; the ledger never saw the request.
    #[error("ledger unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Submission, confirmation, and read access to a ledger.
///
/// `submit` takes a slice: one transaction for standalone submissions, or
/// an already-grouped, already-authorized set that commits atomically.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Submits authorized transactions; returns their IDs on acceptance.
    /// Groups are all-or-nothing: any member failing rejects the whole
    /// submission with no state change.
    async fn submit(&self, txs: &[Transaction]) -> Result<Vec<String>, GatewayError>;

    /// Waits until the transaction is committed, returning its round.
    async fn wait_for_confirmation(
        &self,
        tx_id: &str,
        timeout: Duration,
    ) -> Result<u64, GatewayError>;

    async fn asset_info(&self, asset_id: u64) -> Result<AssetInfo, GatewayError>;

    async fn account_info(&self, address: &Address) -> Result<AccountInfo, GatewayError>;

    async fn transaction(&self, tx_id: &str) -> Result<TransactionRecord, GatewayError>;
}
