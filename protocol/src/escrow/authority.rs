//! Deterministic derivation of per-note escrow authorities.

use serde::{Deserialize, Serialize};

use super::policy::{PolicyError, RedemptionConditions};
use crate::address::Address;

/// A fully derived escrow authority: conditions, compiled program, and the
/// address the program hashes to.
///
/// Derivation is pure — no ledger access, no randomness. Anyone holding
/// the creator address, nonce, and minimum payout reproduces the identical
/// authority, which is what makes the reserve-field check in verification
/// meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowAuthority {
    pub conditions: RedemptionConditions,
    /// Compiled program bytes; attached as authorization on every
    /// transaction the escrow sends.
    pub program: Vec<u8>,
    /// `Address::from_program(program)` — the escrow's ledger identity.
    pub address: Address,
}

impl EscrowAuthority {
    /// Rebuilds an authority from program bytes (the recovery path when
    /// only the mint metadata survives).
    pub fn from_program(program: &[u8]) -> Result<Self, PolicyError> {
        let conditions = RedemptionConditions::decode(program)?;
        Ok(Self {
            conditions,
            program: program.to_vec(),
            address: Address::from_program(program),
        })
    }

    /// Program bytes as hex, for embedding in mint metadata.
    pub fn program_hex(&self) -> String {
        hex::encode(&self.program)
    }
}

/// Derives the escrow authority for one note.
pub fn derive(creator: Address, nonce: u64, min_payout: u64) -> EscrowAuthority {
    let conditions = RedemptionConditions::new(creator, nonce, min_payout);
    let program = conditions.compile();
    let address = Address::from_program(&program);
    EscrowAuthority {
        conditions,
        program,
        address,
    }
}
