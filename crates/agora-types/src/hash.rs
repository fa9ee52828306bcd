use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// 32-byte blake3 digest. Also used as the opaque identity-dedup key
/// bound to an attestation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash([u8; 32]);

impl Hash {
    pub const ZERO: Self = Self([0u8; 32]);
    pub const LEN: usize = 32;

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, TypesError> {
        let bytes: [u8; 32] = slice
            .try_into()
            .map_err(|_| TypesError::InvalidHashLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Compute blake3 hash of data
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Compute blake3 hash over the concatenation of several slices
    pub fn compute_multi(data: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for chunk in data {
            hasher.update(chunk);
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self)
    }
}

impl FromStr for Hash {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_compute() {
        let hash = Hash::compute(b"user1@example.com");
        assert!(!hash.is_zero());
        assert_eq!(hash, Hash::compute(b"user1@example.com"));
        assert_ne!(hash, Hash::compute(b"user2@example.com"));
    }

    #[test]
    fn test_hash_compute_multi_matches_concatenation() {
        assert_eq!(
            Hash::compute_multi(&[b"hello ", b"world"]),
            Hash::compute(b"hello world")
        );
    }

    #[test]
    fn test_hash_parse_with_and_without_prefix() {
        let hash = Hash::compute(b"test");
        let with_prefix: Hash = hash.to_string().parse().unwrap();
        let without_prefix: Hash = hash.to_hex().parse().unwrap();
        assert_eq!(hash, with_prefix);
        assert_eq!(hash, without_prefix);
    }

    #[test]
    fn test_hash_wrong_length() {
        assert!(matches!(
            Hash::from_slice(&[1u8; 31]),
            Err(TypesError::InvalidHashLength(31))
        ));
    }
}
