use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// 20-byte participant or contract address.
/// Display format: Bech32m with the "agora" human-readable prefix.
///
/// # Derivation
/// - participants: `blake3(ed25519_pubkey)[0..20]`
/// - contracts: `blake3(deployer || nonce_le)[0..20]`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);
    pub const LEN: usize = 20;

    /// Bech32m human-readable prefix
    pub const BECH32_HRP: &'static str = "agora";

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Create from a byte slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, TypesError> {
        let bytes: [u8; 20] = slice
            .try_into()
            .map_err(|_| TypesError::InvalidAddressLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Derive address from ed25519 public key bytes.
    pub fn from_public_key(pubkey: &[u8; 32]) -> Self {
        Self::truncate(blake3::hash(pubkey).as_bytes())
    }

    /// Derive the address of a contract deployed by `deployer` at `nonce`.
    pub fn for_contract(deployer: &Address, nonce: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&deployer.0);
        hasher.update(&nonce.to_le_bytes());
        Self::truncate(hasher.finalize().as_bytes())
    }

    fn truncate(digest: &[u8; 32]) -> Self {
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&digest[..20]);
        Self(addr)
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    /// Convert to hex string without 0x prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hrp = bech32::Hrp::parse_unchecked(Self::BECH32_HRP);
        match bech32::encode::<bech32::Bech32m>(hrp, &self.0) {
            Ok(encoded) => write!(f, "{}", encoded),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(self.0))
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = TypesError;

    /// Accepts both Bech32m ("agora1...") and hex ("0x...").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("agora1") {
            let (hrp, data) = bech32::decode(s)
                .map_err(|e| TypesError::Bech32Error(e.to_string()))?;

            if hrp.as_str() != Self::BECH32_HRP {
                return Err(TypesError::InvalidAddressFormat(format!(
                    "Invalid HRP: expected '{}', got '{}'",
                    Self::BECH32_HRP,
                    hrp
                )));
            }

            Self::from_slice(&data)
        } else if let Some(hex_part) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            let bytes = hex::decode(hex_part)?;
            Self::from_slice(&bytes)
        } else {
            Err(TypesError::InvalidAddressFormat(s.to_string()))
        }
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
