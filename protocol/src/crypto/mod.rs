//! Cryptographic primitives used across the protocol.
//!
//! Nothing in here is novel, and that is the point: the fingerprint and
//! addressing schemes consume standard constructions (SHA-256, BLAKE3,
//! Ed25519) as black boxes.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, domain_separated_hash, sha256, sha256_array};
pub use keys::{VaultKeypair, VaultPublicKey, VaultSignature};
