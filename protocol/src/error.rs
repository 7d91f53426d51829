//! Typed workflow failures.
//!
//! Five categories, each carrying the step that failed. Callers branch on
//! the category: validation and verification failures mean the request or
//! the on-chain data is wrong (do not retry); rejections mean the ledger
//! refused a specific transaction; timeouts may resolve themselves;
//! insufficient funds needs a bigger balance.

use thiserror::Error;

use crate::ledger::GatewayError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The request or recovered data failed a local check before any
    /// transaction was built.
    #[error("validation failed at step {step}: {reason}")]
    Validation { step: &'static str, reason: String },

    /// A cryptographic or anti-forgery check failed: fingerprint mismatch,
    /// reserve/escrow mismatch, ownership not confirmed. Always fatal for
    /// the asset in question.
    #[error("verification failed at step {step}: {reason}")]
    Verification { step: &'static str, reason: String },

    /// The ledger evaluated a submission and refused it.
    #[error("ledger rejected step {step}: {reason}")]
    LedgerRejection { step: &'static str, reason: String },

    /// A confirmation wait or the ledger itself timed out.
    #[error("timed out at step {step}: {reason}")]
    Timeout { step: &'static str, reason: String },

    /// A balance check failed before submission.
    #[error("insufficient funds at step {step}: {reason}")]
    InsufficientFunds { step: &'static str, reason: String },
}

impl WorkflowError {
    pub fn validation(step: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            step,
            reason: reason.into(),
        }
    }

    pub fn verification(step: &'static str, reason: impl Into<String>) -> Self {
        Self::Verification {
            step,
            reason: reason.into(),
        }
    }

    pub fn insufficient_funds(step: &'static str, reason: impl Into<String>) -> Self {
        Self::InsufficientFunds {
            step,
            reason: reason.into(),
        }
    }

    /// Maps a gateway failure into the taxonomy at the given step.
    ///
    /// Missing entities become validation failures (the caller asked about
    /// something that does not exist); transport unavailability is treated
    /// like a timeout (retryable, nothing committed for certain).
    pub fn from_gateway(step: &'static str, err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected { reason } => Self::LedgerRejection { step, reason },
            GatewayError::Timeout { tx_id } => Self::Timeout {
                step,
                reason: format!("no confirmation for {tx_id}"),
            },
            GatewayError::NotFound { entity, id } => Self::Validation {
                step,
                reason: format!("{entity} {id} not found"),
            },
            GatewayError::Unavailable { reason } => Self::Timeout { step, reason },
        }
    }

    /// The step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            Self::Validation { step, .. }
            | Self::Verification { step, .. }
            | Self::LedgerRejection { step, .. }
            | Self::Timeout { step, .. }
            | Self::InsufficientFunds { step, .. } => step,
        }
    }

    /// Category tag for logs and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Verification { .. } => "verification",
            Self::LedgerRejection { .. } => "ledger-rejection",
            Self::Timeout { .. } => "timeout",
            Self::InsufficientFunds { .. } => "insufficient-funds",
        }
    }
}
