// Block index database using sled

use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use sled::Db;

use crate::core::{BlockHeader, Hash256, Transaction};
use crate::scan::Consumer;
use crate::storage::{HeaderRecord, TxRecord};

const TIP_KEY: &[u8] = b"m:tip";
const HEIGHT_KEY: &[u8] = b"m:height";

/// Index of scanned headers and transactions
pub struct BlockIndex {
    db: Db,
}

impl BlockIndex {
    /// Open (or create) an index at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let db = sled::open(path).map_err(|e| format!("Failed to open index: {}", e))?;
        Ok(Self { db })
    }

    /// Create an in-memory index (for testing)
    pub fn memory() -> Result<Self, String> {
        let config = sled::Config::new().temporary(true);
        let db = config.open().map_err(|e| format!("Failed to create memory db: {}", e))?;
        Ok(Self { db })
    }

    /// Store a header. Resolved headers also get a height entry and may become the tip.
    pub fn store_header(&self, record: &HeaderRecord) -> Result<(), String> {
        self.put(&Self::block_key(&record.hash), record)?;

        let Some(height) = record.height else {
            return Ok(());
        };

        // first header seen at a height keeps the slot
        let height_key = Self::height_key(height);
        let exists = self
            .db
            .contains_key(&height_key)
            .map_err(|e| format!("Database error: {}", e))?;
        if !exists {
            self.db
                .insert(height_key, record.hash.as_bytes().as_slice())
                .map_err(|e| format!("Failed to store height: {}", e))?;
        }

        if self.get_chain_height()?.is_none_or(|best| height > best) {
            self.db
                .insert(TIP_KEY, record.hash.as_bytes().as_slice())
                .map_err(|e| format!("Failed to store tip: {}", e))?;
            self.db
                .insert(HEIGHT_KEY, height.to_le_bytes().as_slice())
                .map_err(|e| format!("Failed to store height: {}", e))?;
        }

        Ok(())
    }

    /// Get a header by hash
    pub fn get_header(&self, hash: &Hash256) -> Result<Option<HeaderRecord>, String> {
        self.get(&Self::block_key(hash))
    }

    /// Get block hash by height
    pub fn get_hash_by_height(&self, height: u32) -> Result<Option<Hash256>, String> {
        match self
            .db
            .get(Self::height_key(height))
            .map_err(|e| format!("Database error: {}", e))?
        {
            Some(data) => Hash256::from_slice(&data).map(Some).map_err(|e| e.to_string()),
            None => Ok(None),
        }
    }

    /// Get header by height
    pub fn get_header_by_height(&self, height: u32) -> Result<Option<HeaderRecord>, String> {
        match self.get_hash_by_height(height)? {
            Some(hash) => self.get_header(&hash),
            None => Ok(None),
        }
    }

    pub fn store_tx(&self, record: &TxRecord) -> Result<(), String> {
        self.put(&Self::tx_key(&record.txid), record)
    }

    pub fn get_tx(&self, txid: &Hash256) -> Result<Option<TxRecord>, String> {
        self.get(&Self::tx_key(txid))
    }

    /// Number of indexed transactions
    pub fn tx_count(&self) -> usize {
        self.db.scan_prefix(b"t").count()
    }

    /// Hash of the highest resolved header
    pub fn get_tip(&self) -> Result<Option<Hash256>, String> {
        match self.db.get(TIP_KEY).map_err(|e| format!("Database error: {}", e))? {
            Some(data) => Hash256::from_slice(&data).map(Some).map_err(|e| e.to_string()),
            None => Ok(None),
        }
    }

    /// Height of the tip, None while no header has been indexed
    pub fn get_chain_height(&self) -> Result<Option<u32>, String> {
        match self.db.get(HEIGHT_KEY).map_err(|e| format!("Database error: {}", e))? {
            Some(data) => {
                let bytes: [u8; 4] = data
                    .as_ref()
                    .try_into()
                    .map_err(|_| format!("Invalid height data length: {}", data.len()))?;
                Ok(Some(u32::from_le_bytes(bytes)))
            }
            None => Ok(None),
        }
    }

    /// Manually flush database (call after batch operations)
    pub fn flush(&self) -> Result<(), String> {
        self.db
            .flush()
            .map_err(|e| format!("Failed to flush: {}", e))?;
        Ok(())
    }

    fn put<T: Serialize>(&self, key: &[u8], value: &T) -> Result<(), String> {
        let data = serde_json::to_vec(value).map_err(|e| format!("Failed to encode record: {}", e))?;
        self.db
            .insert(key, data)
            .map_err(|e| format!("Failed to store record: {}", e))?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, String> {
        match self.db.get(key).map_err(|e| format!("Database error: {}", e))? {
            Some(data) => serde_json::from_slice(&data)
                .map(Some)
                .map_err(|e| format!("Corrupt record: {}", e)),
            None => Ok(None),
        }
    }

    // Helper: create key for header storage
    fn block_key(hash: &Hash256) -> Vec<u8> {
        let mut key = Vec::with_capacity(33);
        key.push(b'b'); // 'b' for block
        key.extend_from_slice(hash.as_bytes());
        key
    }

    // Helper: create key for height index (big-endian keeps heights ordered)
    fn height_key(height: u32) -> Vec<u8> {
        let mut key = Vec::with_capacity(5);
        key.push(b'h'); // 'h' for height
        key.extend_from_slice(&height.to_be_bytes());
        key
    }

    fn tx_key(txid: &Hash256) -> Vec<u8> {
        let mut key = Vec::with_capacity(33);
        key.push(b't');
        key.extend_from_slice(txid.as_bytes());
        key
    }
}

impl Consumer for BlockIndex {
    fn on_block_header(&mut self, header: BlockHeader) -> Result<(), String> {
        self.store_header(&HeaderRecord::from(&header))
    }

    fn on_transaction(&mut self, tx: Transaction) -> Result<(), String> {
        self.store_tx(&TxRecord::from(&tx))
    }
}
