//! Note identity: parameters, security fingerprint, and mint metadata.

pub mod fingerprint;
pub mod metadata;
pub mod params;

pub use fingerprint::Fingerprint;
pub use metadata::{MetadataError, MintMetadata};
pub use params::{TokenParameters, TokenParamsError};
