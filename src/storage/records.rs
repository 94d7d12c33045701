// Flat, serializable views of decoded headers and transactions

use serde::{Deserialize, Serialize};

use crate::core::{BlockHeader, Hash256, Transaction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRecord {
    pub hash: Hash256,
    pub height: Option<u32>,
    pub version: u32,
    pub prev_hash: Hash256,
    pub merkle_root: Hash256,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
    pub size: u32,
}

impl From<&BlockHeader> for HeaderRecord {
    fn from(header: &BlockHeader) -> Self {
        Self {
            hash: header.hash,
            height: header.height,
            version: header.version,
            prev_hash: header.prev_block_hash,
            merkle_root: header.merkle_root,
            timestamp: header.timestamp,
            bits: header.bits,
            nonce: header.nonce,
            size: header.size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    pub txid: Hash256,
    pub hash: Hash256,
    pub version: u32,
    pub segwit: bool,
    pub coinbase: bool,
    pub inputs: usize,
    pub outputs: usize,
    /// Sum of output amounts in satoshis, null if it overflows
    pub total_output: Option<i64>,
    pub lock_time: u32,
    pub size: usize,
    pub vsize: usize,
    pub weight: usize,
}

impl From<&Transaction> for TxRecord {
    fn from(tx: &Transaction) -> Self {
        Self {
            txid: tx.txid,
            hash: tx.hash,
            version: tx.version,
            segwit: tx.segwit,
            coinbase: tx.is_coinbase(),
            inputs: tx.inputs.len(),
            outputs: tx.outputs.len(),
            total_output: tx.total_output_value(),
            lock_time: tx.lock_time,
            size: tx.size(),
            vsize: tx.vsize(),
            weight: tx.weight(),
        }
    }
}

/// Tagged record, one per line of JSON output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    Header(HeaderRecord),
    Tx(TxRecord),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_record_json() {
        let mut header = BlockHeader::new(1, Hash256::zero(), Hash256::zero(), 7, 8, 9, 285);
        header.height = Some(3);

        let json = serde_json::to_value(Record::Header(HeaderRecord::from(&header))).unwrap();
        assert_eq!(json["type"], "header");
        assert_eq!(json["height"], 3);
        assert_eq!(json["hash"], header.hash.to_hex());
        assert_eq!(json["prev_hash"], Hash256::zero().to_hex());
        assert_eq!(json["size"], 285);
    }

    #[test]
    fn test_tx_record_overflowing_total() {
        let mut raw = 1u32.to_le_bytes().to_vec();
        raw.extend_from_slice(&[0x00, 0x02]);
        for value in [i64::MAX, 1] {
            raw.extend_from_slice(&value.to_le_bytes());
            raw.push(0x00);
        }
        raw.extend_from_slice(&0u32.to_le_bytes());
        let tx = Transaction::from_bytes(&raw).unwrap();

        let record = TxRecord::from(&tx);
        assert_eq!(record.total_output, None);
        assert_eq!(record.outputs, 2);

        let json = serde_json::to_value(Record::Tx(record)).unwrap();
        assert_eq!(json["type"], "tx");
        assert!(json["total_output"].is_null());
    }
}
