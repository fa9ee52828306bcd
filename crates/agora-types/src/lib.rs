//! Agora Types - Primitive type definitions shared by every Agora crate.
//!
//! This crate provides:
//! - Addresses (20-byte, Bech32m encoded, `agora1...`)
//! - Hashes (32-byte, blake3 digests)
//! - Ed25519 public keys and signatures

pub mod address;
pub mod hash;
pub mod signature;
pub mod error;

#[cfg(feature = "serde")]
mod serialization;

pub use address::Address;
pub use hash::Hash;
pub use signature::{Ed25519PublicKey, Ed25519Signature};
pub use error::TypesError;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Address, Ed25519PublicKey, Ed25519Signature, Hash, TypesError};
}
