//! Ledger access: read models, the gateway trait, and the in-memory
//! sandbox implementation used by tests and the CLI demo.

pub mod gateway;
pub mod memory;
pub mod types;

pub use gateway::{GatewayError, LedgerGateway};
pub use memory::InMemoryLedger;
pub use types::{AccountInfo, AssetHolding, AssetInfo, TransactionRecord};
