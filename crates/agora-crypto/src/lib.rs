//! Agora Crypto - Cryptographic primitives for Agora governance.
//!
//! This crate provides:
//! - Ed25519 keypairs and signature verification (attestation signing)
//! - Blake3 hashing with domain separation

pub mod ed25519;
pub mod hash;
pub mod error;

pub use ed25519::{Keypair, verify as ed25519_verify};
pub use hash::{hash, hash_multi, hash_with_domain};
pub use error::CryptoError;
