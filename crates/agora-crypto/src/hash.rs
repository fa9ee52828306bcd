//! Blake3 hashing utilities.

use agora_types::Hash;

/// Compute blake3 hash of data
pub fn hash(data: &[u8]) -> Hash {
    Hash::compute(data)
}

/// Compute blake3 hash of multiple data slices
pub fn hash_multi(data: &[&[u8]]) -> Hash {
    Hash::compute_multi(data)
}

/// Hash with a domain separator.
///
/// The domain is length-prefixed so that `("ab", "c")` and `("a", "bc")`
/// can never collide.
pub fn hash_with_domain(data: &[u8], domain: &str) -> Hash {
    let len = (domain.len() as u64).to_le_bytes();
    hash_multi(&[&len, domain.as_bytes(), data])
}
