use crate::error::CryptoError;
use agora_types::{Address, Ed25519PublicKey, Ed25519Signature, Hash};
use ed25519_dalek::Signer;
use rand::rngs::OsRng;
use std::fmt;
use zeroize::Zeroizing;

/// Ed25519 keypair. The signing key is zeroized on drop by ed25519-dalek.
pub struct Keypair {
    signing_key: ed25519_dalek::SigningKey,
}

impl Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = ed25519_dalek::SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Parse a hex-encoded seed (with or without `0x`).
    pub fn from_seed_hex(seed: &str) -> Result<Self, CryptoError> {
        let seed = seed.strip_prefix("0x").unwrap_or(seed);
        let bytes = Zeroizing::new(hex::decode(seed)?);
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidSeedLength(bytes.len()))?;
        Ok(Self::from_seed(&seed))
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey::from_bytes(self.signing_key.verifying_key().to_bytes())
    }

    /// Address derived from this keypair
    pub fn address(&self) -> Address {
        self.public_key().to_address()
    }

    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature::from_bytes(self.signing_key.sign(message).to_bytes())
    }

    /// Sign a 32-byte digest, e.g. an attestation digest.
    pub fn sign_digest(&self, digest: &Hash) -> Ed25519Signature {
        self.sign(digest.as_bytes())
    }

    /// Export the seed (CAUTION: sensitive)
    pub fn seed(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", self.address())
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.seed())
    }
}

/// Verify an ed25519 signature.
pub fn verify(
    public_key: &Ed25519PublicKey,
    message: &[u8],
    signature: &Ed25519Signature,
) -> Result<(), CryptoError> {
    let pk = ed25519_dalek::VerifyingKey::from_bytes(public_key.as_bytes())
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    pk.verify_strict(message, &sig)?;
    Ok(())
}
