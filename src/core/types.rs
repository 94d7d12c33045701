// Basic types for block archive decoding

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::{hash256, DecodeError};

/// 256-bit hash type (32 bytes)
/// Used for block hashes, transaction IDs, and Merkle roots.
/// Bytes are kept in the order the hash function produced them;
/// the hex form is reversed (Bitcoin display convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// Create a new Hash256 from a byte array
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a Hash256 from a slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, DecodeError> {
        let bytes: [u8; 32] = slice
            .try_into()
            .map_err(|_| DecodeError::InvalidLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Double SHA256 of arbitrary data
    pub fn from_data(data: &[u8]) -> Self {
        hash256(data)
    }

    /// Get the hash as a byte slice
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create zero hash
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Convert to hex string (reversed for display, Bitcoin convention)
    pub fn to_hex(&self) -> String {
        let mut reversed = self.0;
        reversed.reverse();
        hex::encode(reversed)
    }

    /// Create from hex string (expects reversed byte order)
    pub fn from_hex(hex_str: &str) -> Result<Self, DecodeError> {
        let bytes = hex::decode(hex_str)?;
        let mut hash = Self::from_slice(&bytes)?;
        hash.0.reverse();
        Ok(hash)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Hash256 {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash256_creation() {
        let hash = Hash256::new([1u8; 32]);
        assert_eq!(hash.as_bytes(), &[1u8; 32]);
    }

    #[test]
    fn test_hash256_zero() {
        let zero = Hash256::zero();
        assert_eq!(zero.as_bytes(), &[0u8; 32]);
        assert!(zero.is_zero());
    }

    #[test]
    fn test_from_slice_wrong_length() {
        assert_eq!(
            Hash256::from_slice(&[0u8; 31]),
            Err(DecodeError::InvalidLength(31))
        );
        assert_eq!(
            Hash256::from_slice(&[0u8; 33]),
            Err(DecodeError::InvalidLength(33))
        );
    }

    #[test]
    fn test_hex_is_reversed() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xab;
        bytes[31] = 0x01;
        let hash = Hash256::new(bytes);
        let hex = hash.to_hex();
        assert!(hex.starts_with("01"));
        assert!(hex.ends_with("ab"));

        let decoded = Hash256::from_hex(&hex).unwrap();
        assert_eq!(hash, decoded);
    }

    #[test]
    fn test_from_hex_invalid() {
        assert!(matches!(Hash256::from_hex("zz"), Err(DecodeError::InvalidHex(_))));
        assert_eq!(Hash256::from_hex("abcd"), Err(DecodeError::InvalidLength(2)));
    }

    #[test]
    fn test_serde_uses_display_form() {
        let hash: Hash256 = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
            .parse()
            .unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(
            json,
            "\"000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f\""
        );
        let back: Hash256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
