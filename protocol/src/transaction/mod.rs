//! Transaction construction, grouping, and authorization.
//!
//! A transaction is a header (sender, fee, sequence, timestamp) plus a
//! [`TxBody`] describing the state change. Transactions may be bound into
//! an atomic group that the ledger commits or rejects as a unit — the
//! redemption swap depends on this.
//!
//! Authorization comes in two flavors: an Ed25519 signature from the
//! sender's key, or the escrow program whose address *is* the sender.

pub mod builder;
pub mod signing;
pub mod types;

pub use builder::{assign_group, Transaction, TransactionBuilder};
pub use signing::{authorize_with_program, sign_transaction};
pub use types::{AssetCreateParams, Authorization, TxBody};
