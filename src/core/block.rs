// Block header decoding

use crate::core::{ByteReader, DecodeError, Hash256};

/// Serialized length of a block header
pub const HEADER_SIZE: usize = 80;

/// Block header - 80 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block version
    pub version: u32,
    /// Hash of the previous block
    pub prev_block_hash: Hash256,
    /// Merkle root of all transactions in the block
    pub merkle_root: Hash256,
    /// Block timestamp (Unix epoch)
    pub timestamp: u32,
    /// Difficulty target (compact format)
    pub bits: u32,
    /// Nonce for proof-of-work
    pub nonce: u32,
    /// Chain height, set once by the height resolver
    pub height: Option<u32>,
    /// Double SHA256 of `raw`
    pub hash: Hash256,
    /// The 80 serialized header bytes
    pub raw: [u8; HEADER_SIZE],
    /// Block size declared in the archive record
    pub size: u32,
}

impl BlockHeader {
    /// Build a header from its fields, serializing it to compute `raw` and `hash`
    pub fn new(
        version: u32,
        prev_block_hash: Hash256,
        merkle_root: Hash256,
        timestamp: u32,
        bits: u32,
        nonce: u32,
        size: u32,
    ) -> Self {
        let mut raw = [0u8; HEADER_SIZE];
        raw[0..4].copy_from_slice(&version.to_le_bytes());
        raw[4..36].copy_from_slice(prev_block_hash.as_bytes());
        raw[36..68].copy_from_slice(merkle_root.as_bytes());
        raw[68..72].copy_from_slice(&timestamp.to_le_bytes());
        raw[72..76].copy_from_slice(&bits.to_le_bytes());
        raw[76..80].copy_from_slice(&nonce.to_le_bytes());

        Self {
            version,
            prev_block_hash,
            merkle_root,
            timestamp,
            bits,
            nonce,
            height: None,
            hash: Hash256::from_data(&raw),
            raw,
            size,
        }
    }

    /// Decode a header from its raw bytes. Only the first 80 bytes are used.
    pub fn parse(data: &[u8], size: u32) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(data);
        let raw: [u8; HEADER_SIZE] = reader.read_array()?;

        let mut h = ByteReader::new(&raw);
        let version = h.read_u32_le()?;
        let prev_block_hash = Hash256::new(h.read_array()?);
        let merkle_root = Hash256::new(h.read_array()?);
        let timestamp = h.read_u32_le()?;
        let bits = h.read_u32_le()?;
        let nonce = h.read_u32_le()?;

        Ok(Self {
            version,
            prev_block_hash,
            merkle_root,
            timestamp,
            bits,
            nonce,
            height: None,
            hash: Hash256::from_data(&raw),
            raw,
            size,
        })
    }

    /// Read a header from the current position of an archive reader
    pub fn read(reader: &mut ByteReader<'_>, size: u32) -> Result<Self, DecodeError> {
        let raw = reader.read_bytes(HEADER_SIZE)?;
        Self::parse(raw, size)
    }
}
