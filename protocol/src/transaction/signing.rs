//! Transaction authorization: key signatures and program authority.
//!
//! Key-based accounts sign with Ed25519 over the canonical signable bytes.
//! Escrow accounts attach their program instead — the ledger checks that
//! the program hashes to the sender address and that its redemption
//! conditions admit the transaction in its group context. No escrow
//! private key exists anywhere in the system.

use super::builder::Transaction;
use super::types::Authorization;
use crate::crypto::keys::VaultKeypair;

/// Signs a transaction in place with the sender's keypair.
///
/// Call this *after* group assignment: the group binding is part of the
/// signed bytes, and [`super::assign_group`] rewrites it.
pub fn sign_transaction<'a>(tx: &'a mut Transaction, keypair: &VaultKeypair) -> &'a Transaction {
    let signable = tx.signable_bytes();
    let signature = keypair.sign(&signable);
    tx.authorization = Some(Authorization::Key {
        public_key: keypair.public_key().to_hex(),
        signature: signature.to_hex(),
    });
    tx
}

/// Attaches escrow program bytes as the transaction's authorization.
///
/// Validity is decided by the ledger at submission time, not here: the
/// program must hash to the sender address and its conditions must admit
/// the transaction. Attaching the wrong program is cheap; getting it past
/// the ledger is not.
pub fn authorize_with_program<'a>(tx: &'a mut Transaction, program: &[u8]) -> &'a Transaction {
    tx.authorization = Some(Authorization::Program {
        program: program.to_vec(),
    });
    tx
}
