//! # Key Management
//!
//! Ed25519 keypairs for ordinary (key-based) accounts: the creator who funds
//! an escrow and the holder who redeems a note. Escrow accounts themselves
//! are *not* key-based — their spending authority is a program (see
//! [`crate::escrow`]), which is the whole trick that makes redemption
//! trustless.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - Key generation uses `OsRng`. If your OS RNG is broken, you have bigger
//!   problems than a locked note.
//! - Key bytes are never logged. If you add logging to this module, you
//!   will be asked to leave.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during key operations.
///
/// Intentionally vague about *why* something failed — leaking details about
/// key material through error messages is a classic footgun.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature encoding")]
    InvalidSignature,
}

/// An Ed25519 keypair controlling a key-based ledger account.
///
/// Does NOT implement `Serialize`/`Deserialize`. Serializing private keys
/// should be a deliberate act, not something that happens because a keypair
/// ended up inside a JSON response. Use `to_seed_bytes()` / `from_seed`
/// explicitly.
#[derive(Clone)]
pub struct VaultKeypair {
    signing_key: SigningKey,
}

/// The public half of a keypair, safe to share with the world.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultPublicKey {
    bytes: [u8; 32],
}

/// An Ed25519 signature over a message. Always exactly 64 bytes.
///
/// If someone hands you a signature that isn't 64 bytes, verification
/// simply fails — no panics, no undefined behavior, just `false`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSignature {
    bytes: Vec<u8>,
}

impl VaultKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    ///
    /// Useful for deriving keypairs from mnemonics or KDF output, and for
    /// reproducible test fixtures.
    pub fn from_seed(seed: [u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Returns the 32-byte secret seed. Handle with appropriate paranoia.
    pub fn to_seed_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes()
    }

    /// Returns the public verification key.
    pub fn public_key(&self) -> VaultPublicKey {
        VaultPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Signs a message, producing a 64-byte Ed25519 signature.
    ///
    /// Deterministic for a given (key, message) pair — no nonce management,
    /// no k-value disasters.
    pub fn sign(&self, message: &[u8]) -> VaultSignature {
        let sig = self.signing_key.sign(message);
        VaultSignature {
            bytes: sig.to_bytes().to_vec(),
        }
    }

    /// Verifies a signature produced by this keypair's public key.
    pub fn verify(&self, message: &[u8], signature: &VaultSignature) -> bool {
        self.public_key().verify(message, signature)
    }
}

impl VaultPublicKey {
    /// Constructs a public key from raw bytes, validating that they encode
    /// a real Ed25519 point.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, KeyError> {
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Parses a hex-encoded public key (64 hex characters).
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidPublicKey)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        Self::from_bytes(arr)
    }

    /// Returns the raw 32-byte encoding.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Returns the hex encoding (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Verifies an Ed25519 signature over a message.
    ///
    /// Returns `false` for malformed keys or signatures rather than
    /// erroring — a bad signature is a data condition, not a programming
    /// error.
    pub fn verify(&self, message: &[u8], signature: &VaultSignature) -> bool {
        let Ok(vk) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(signature.bytes.as_slice()) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&sig_bytes);
        vk.verify(message, &sig).is_ok()
    }
}

impl fmt::Debug for VaultPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VaultPublicKey({})", self.to_hex())
    }
}

impl VaultSignature {
    /// Wraps a 64-byte signature.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Parses a hex-encoded signature (128 hex characters).
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSignature)?;
        if bytes.len() != 64 {
            return Err(KeyError::InvalidSignature);
        }
        Ok(Self { bytes })
    }

    /// Returns the hex encoding (128 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Debug for VaultSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VaultSignature({})", self.to_hex())
    }
}
