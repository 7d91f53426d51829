//! The signing boundary.
//!
//! Orchestrators build unsigned transactions and hand them across this
//! trait; whoever holds the key signs. In tests and the CLI demo that is
//! [`KeypairSigner`]; a deployment could put a hardware wallet or remote
//! signing service behind the same trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::address::Address;
use crate::crypto::keys::VaultKeypair;
use crate::transaction::{sign_transaction, Transaction};

#[derive(Debug, Error)]
pub enum SignerError {
    /// The signer declined or could not produce a signature.
    #[error("signer refused: {reason}")]
    Refused { reason: String },
}

/// Produces signatures for one key-based account.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// The address this signer controls. Orchestrators use it as the
    /// creator (mint) or redeemer (redeem) identity.
    fn address(&self) -> Address;

    /// Signs the transaction in place. Must be called after group
    /// assignment; the group binding is part of the signed bytes.
    async fn sign(&self, tx: &mut Transaction) -> Result<(), SignerError>;
}

/// An in-process signer wrapping a keypair.
pub struct KeypairSigner {
    keypair: VaultKeypair,
    address: Address,
}

impl KeypairSigner {
    pub fn new(keypair: VaultKeypair) -> Self {
        let address = Address::from_public_key(&keypair.public_key());
        Self { keypair, address }
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign(&self, tx: &mut Transaction) -> Result<(), SignerError> {
        if tx.sender != self.address {
            return Err(SignerError::Refused {
                reason: format!("transaction sender {} is not this signer", tx.sender),
            });
        }
        sign_transaction(tx, &self.keypair);
        Ok(())
    }
}
