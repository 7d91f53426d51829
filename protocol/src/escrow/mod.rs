//! Escrow authority derivation and the redemption policy compiler.
//!
//! Every note gets its own escrow account whose spending authority is a
//! *program*, not a key: a compact, versioned encoding of the redemption
//! conditions it enforces. The program's one-way hash is the escrow's
//! address, so the authority is fully recomputable from public parameters —
//! nothing about the escrow needs to be stored anywhere except inside the
//! mint transaction's public metadata.

pub mod authority;
pub mod policy;

pub use authority::{derive, EscrowAuthority};
pub use policy::{PolicyError, RedemptionConditions};
