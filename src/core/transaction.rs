// Transaction decoding, including segwit

use crate::core::{ByteReader, DecodeError, Hash256};

/// Marker + flag bytes (`00 01`) following the version of a segwit transaction, read as u16 LE
pub const SEGWIT_MARKER: u16 = 0x0100;

/// Transaction input - references a previous transaction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// Position of this input in the transaction
    pub vin: usize,
    /// Hash of the previous transaction
    pub prev_tx_hash: Hash256,
    /// Index of the output in the previous transaction
    pub prev_index: u32,
    /// Signature script (scriptSig)
    pub script_sig: Vec<u8>,
    /// Sequence number
    pub sequence: u32,
    /// Witness stack, empty for non-segwit transactions
    pub witness: Vec<Vec<u8>>,
}

impl TxInput {
    /// Check if this is a coinbase input
    pub fn is_coinbase(&self) -> bool {
        self.prev_tx_hash.is_zero() && self.prev_index == 0xffffffff
    }

    fn read(reader: &mut ByteReader<'_>, vin: usize) -> Result<Self, DecodeError> {
        let prev_tx_hash = Hash256::new(reader.read_array()?);
        let prev_index = reader.read_u32_le()?;
        let script_sig = reader.read_var_bytes()?.to_vec();
        let sequence = reader.read_u32_le()?;

        Ok(Self {
            vin,
            prev_tx_hash,
            prev_index,
            script_sig,
            sequence,
            witness: Vec::new(),
        })
    }
}

/// Transaction output - specifies amount and recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    /// Position of this output in the transaction
    pub vout: usize,
    /// Amount in satoshis
    pub value: i64,
    /// Public key script (scriptPubKey)
    pub script_pubkey: Vec<u8>,
}

impl TxOutput {
    fn read(reader: &mut ByteReader<'_>, vout: usize) -> Result<Self, DecodeError> {
        let value = reader.read_i64_le()?;
        let script_pubkey = reader.read_var_bytes()?.to_vec();

        Ok(Self {
            vout,
            value,
            script_pubkey,
        })
    }
}

/// Transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Transaction version
    pub version: u32,
    /// Whether the transaction was serialized with the segwit marker
    pub segwit: bool,
    /// Transaction inputs
    pub inputs: Vec<TxInput>,
    /// Transaction outputs
    pub outputs: Vec<TxOutput>,
    /// Lock time
    pub lock_time: u32,
    /// Transaction ID, double SHA256 of `raw_legacy`
    pub txid: Hash256,
    /// Witness hash, double SHA256 of `raw`
    pub hash: Hash256,
    /// Full serialization as found in the archive
    pub raw: Vec<u8>,
    /// Serialization without segwit marker and witness data
    pub raw_legacy: Vec<u8>,
}

impl Transaction {
    /// Decode one transaction starting at the reader's position.
    ///
    /// Raw serializations are sliced out of the reader's underlying buffer,
    /// so the reader may be positioned anywhere inside a larger block.
    pub fn parse(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let buf = reader.buffer();
        let start = reader.position();

        let version = reader.read_u32_le()?;

        let segwit = reader.read_u16_le()? == SEGWIT_MARKER;
        if !segwit {
            reader.move_by(-2)?;
        }

        let input_count = reader.read_varint_usize()?;
        let mut inputs = Vec::with_capacity(input_count.min(reader.remaining()));
        for vin in 0..input_count {
            inputs.push(TxInput::read(reader, vin)?);
        }

        let output_count = reader.read_varint_usize()?;
        let mut outputs = Vec::with_capacity(output_count.min(reader.remaining()));
        for vout in 0..output_count {
            outputs.push(TxOutput::read(reader, vout)?);
        }

        let witness_start = reader.position();
        if segwit {
            for input in inputs.iter_mut() {
                let elements = reader.read_varint_usize()?;
                for _ in 0..elements {
                    input.witness.push(reader.read_var_bytes()?.to_vec());
                }
            }
        }
        let witness_len = reader.position() - witness_start;

        let lock_time = reader.read_u32_le()?;
        let end = reader.position();

        let raw = buf[start..end].to_vec();
        let raw_legacy = if segwit {
            let mut legacy = Vec::with_capacity(raw.len() - 2 - witness_len);
            legacy.extend_from_slice(&buf[start..start + 4]);
            legacy.extend_from_slice(&buf[start + 6..witness_start]);
            legacy.extend_from_slice(&buf[end - 4..end]);
            legacy
        } else {
            raw.clone()
        };

        Ok(Self {
            version,
            segwit,
            inputs,
            outputs,
            lock_time,
            txid: Hash256::from_data(&raw_legacy),
            hash: Hash256::from_data(&raw),
            raw,
            raw_legacy,
        })
    }

    /// Decode a standalone transaction
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        Self::parse(&mut ByteReader::new(data))
    }

    /// Check if this is a coinbase transaction
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }

    /// Calculate total output value, None if the sum overflows
    pub fn total_output_value(&self) -> Option<i64> {
        self.outputs
            .iter()
            .try_fold(0i64, |total, out| total.checked_add(out.value))
    }

    /// Serialized size including witness data
    pub fn size(&self) -> usize {
        self.raw.len()
    }

    /// Serialized size without witness data
    pub fn stripped_size(&self) -> usize {
        self.raw_legacy.len()
    }

    /// Weight units: witness bytes count once, everything else four times
    pub fn weight(&self) -> usize {
        self.stripped_size() * 3 + self.size()
    }

    /// Virtual size, weight / 4 rounded up
    pub fn vsize(&self) -> usize {
        self.weight().div_ceil(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{write_var_bytes, write_varint};

    const GENESIS_PUBKEY: &str = "04678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5f";

    fn genesis_coinbase() -> Vec<u8> {
        let mut script_sig = hex::decode("04ffff001d010445").unwrap();
        script_sig.extend_from_slice(
            b"The Times 03/Jan/2009 Chancellor on brink of second bailout for banks",
        );
        let mut script_pubkey = vec![0x41];
        script_pubkey.extend_from_slice(&hex::decode(GENESIS_PUBKEY).unwrap());
        script_pubkey.push(0xac);

        let mut buf = Vec::new();
        buf.extend_from_slice(&1u32.to_le_bytes());
        write_varint(&mut buf, 1).unwrap();
        buf.extend_from_slice(&[0u8; 32]);
        buf.extend_from_slice(&0xffffffffu32.to_le_bytes());
        write_var_bytes(&mut buf, &script_sig).unwrap();
        buf.extend_from_slice(&0xffffffffu32.to_le_bytes());
        write_varint(&mut buf, 1).unwrap();
        buf.extend_from_slice(&5_000_000_000i64.to_le_bytes());
        write_var_bytes(&mut buf, &script_pubkey).unwrap();
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf
    }

    /// Two-input segwit transaction; the second input has an empty witness
    fn segwit_tx() -> (Vec<u8>, Vec<u8>) {
        let mut ins = Vec::new();
        write_varint(&mut ins, 2).unwrap();
        for i in 0..2u8 {
            ins.extend_from_slice(&[i + 1; 32]);
            ins.extend_from_slice(&(i as u32).to_le_bytes());
            write_var_bytes(&mut ins, &[]).unwrap();
            ins.extend_from_slice(&0xfffffffdu32.to_le_bytes());
        }
        write_varint(&mut ins, 1).unwrap();
        ins.extend_from_slice(&12_345i64.to_le_bytes());
        write_var_bytes(&mut ins, &[0x00, 0x14, 0xaa, 0xbb]).unwrap();

        let mut witness = Vec::new();
        write_varint(&mut witness, 2).unwrap();
        write_var_bytes(&mut witness, &[0x30; 71]).unwrap();
        write_var_bytes(&mut witness, &[0x02; 33]).unwrap();
        write_varint(&mut witness, 0).unwrap();

        let version = 2u32.to_le_bytes();
        let locktime = 500_000u32.to_le_bytes();

        let mut full = Vec::new();
        full.extend_from_slice(&version);
        full.extend_from_slice(&[0x00, 0x01]);
        full.extend_from_slice(&ins);
        full.extend_from_slice(&witness);
        full.extend_from_slice(&locktime);

        let mut legacy = Vec::new();
        legacy.extend_from_slice(&version);
        legacy.extend_from_slice(&ins);
        legacy.extend_from_slice(&locktime);

        (full, legacy)
    }

    #[test]
    fn test_genesis_coinbase() {
        let raw = genesis_coinbase();
        let tx = Transaction::from_bytes(&raw).unwrap();

        assert_eq!(tx.version, 1);
        assert!(!tx.segwit);
        assert!(tx.is_coinbase());
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.total_output_value(), Some(5_000_000_000));
        assert_eq!(tx.lock_time, 0);
        assert_eq!(
            tx.txid.to_hex(),
            "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
        );
        assert_eq!(tx.size(), 204);
    }

    #[test]
    fn test_legacy_tx_has_identical_digests() {
        let raw = genesis_coinbase();
        let tx = Transaction::from_bytes(&raw).unwrap();
        assert_eq!(tx.txid, tx.hash);
        assert_eq!(tx.raw, tx.raw_legacy);
        assert_eq!(tx.raw, raw);
        assert_eq!(tx.weight(), raw.len() * 4);
        assert_eq!(tx.vsize(), raw.len());
    }

    #[test]
    fn test_segwit_tx() {
        let (full, legacy) = segwit_tx();
        let tx = Transaction::from_bytes(&full).unwrap();

        assert!(tx.segwit);
        assert_eq!(tx.version, 2);
        assert_eq!(tx.lock_time, 500_000);
        assert_eq!(tx.inputs.len(), 2);
        assert_eq!(tx.inputs[0].witness, vec![vec![0x30; 71], vec![0x02; 33]]);
        assert!(tx.inputs[1].witness.is_empty());
        assert_eq!(tx.inputs[1].vin, 1);
        assert_eq!(tx.inputs[1].prev_index, 1);
        assert_eq!(tx.outputs[0].value, 12_345);

        assert_eq!(tx.raw, full);
        assert_eq!(tx.raw_legacy, legacy);
        assert!(tx.size() > tx.stripped_size());
        assert_eq!(tx.txid, Hash256::from_data(&legacy));
        assert_eq!(tx.hash, Hash256::from_data(&full));
        assert_ne!(tx.txid, tx.hash);
        assert!(!tx.is_coinbase());
    }

    #[test]
    fn test_parse_inside_larger_buffer() {
        let (segwit, legacy) = segwit_tx();
        let coinbase = genesis_coinbase();

        let mut buf = vec![0xee; 7];
        buf.extend_from_slice(&coinbase);
        buf.extend_from_slice(&segwit);
        buf.extend_from_slice(&[0xee; 3]);

        let mut reader = ByteReader::new(&buf);
        reader.seek(7).unwrap();
        let first = Transaction::parse(&mut reader).unwrap();
        let second = Transaction::parse(&mut reader).unwrap();

        assert_eq!(first.raw, coinbase);
        assert_eq!(second.raw, segwit);
        assert_eq!(second.raw_legacy, legacy);
        assert_eq!(reader.remaining(), 3);
    }

    #[test]
    fn test_negative_amount_is_kept() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&1u32.to_le_bytes());
        write_varint(&mut raw, 0).unwrap();
        // two outputs, so the `00 02` after the version is not taken for a marker
        write_varint(&mut raw, 2).unwrap();
        raw.extend_from_slice(&(-1i64).to_le_bytes());
        write_var_bytes(&mut raw, &[]).unwrap();
        raw.extend_from_slice(&5i64.to_le_bytes());
        write_var_bytes(&mut raw, &[0x51]).unwrap();
        raw.extend_from_slice(&0u32.to_le_bytes());

        let tx = Transaction::from_bytes(&raw).unwrap();
        assert!(!tx.segwit);
        assert!(tx.inputs.is_empty());
        assert_eq!(tx.outputs[0].value, -1);
        assert_eq!(tx.outputs[1].vout, 1);
        assert_eq!(tx.total_output_value(), Some(4));
    }

    #[test]
    fn test_total_output_overflow() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&1u32.to_le_bytes());
        write_varint(&mut raw, 0).unwrap();
        write_varint(&mut raw, 2).unwrap();
        for value in [i64::MAX, 1] {
            raw.extend_from_slice(&value.to_le_bytes());
            write_var_bytes(&mut raw, &[]).unwrap();
        }
        raw.extend_from_slice(&0u32.to_le_bytes());

        let tx = Transaction::from_bytes(&raw).unwrap();
        assert_eq!(tx.outputs[0].value, i64::MAX);
        assert_eq!(tx.total_output_value(), None);
    }

    #[test]
    fn test_zero_input_single_output_reads_as_segwit() {
        // version, no inputs, one empty zero-value output, lock time
        let mut raw = Vec::new();
        raw.extend_from_slice(&1u32.to_le_bytes());
        write_varint(&mut raw, 0).unwrap();
        write_varint(&mut raw, 1).unwrap();
        raw.extend_from_slice(&0i64.to_le_bytes());
        write_var_bytes(&mut raw, &[]).unwrap();
        raw.extend_from_slice(&0u32.to_le_bytes());

        // `00 01` matches the marker, so the amount bytes are read as
        // the input count, output count and lock time
        let tx = Transaction::from_bytes(&raw).unwrap();
        assert!(tx.segwit);
        assert!(tx.inputs.is_empty());
        assert!(tx.outputs.is_empty());
        assert_eq!(tx.size(), 12);
        assert_eq!(tx.stripped_size(), 10);
        assert_eq!(tx.raw, raw[..12]);
        assert_ne!(tx.txid, tx.hash);
    }

    #[test]
    fn test_truncated_tx() {
        let raw = genesis_coinbase();
        let err = Transaction::from_bytes(&raw[..raw.len() - 2]).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEndOfBuffer { .. }));
    }

    #[test]
    fn test_oversized_count() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&1u32.to_le_bytes());
        raw.push(0xff);
        raw.extend_from_slice(&u64::MAX.to_le_bytes());
        assert_eq!(
            Transaction::from_bytes(&raw),
            Err(DecodeError::ValueTooLarge(u64::MAX))
        );
    }
}
