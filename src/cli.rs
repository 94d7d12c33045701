// CLI commands

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ScanConfig;
use crate::core::{BlockHeader, Hash256, Transaction};
use crate::network::Network;
use crate::scan::{run_scan, Consumer};
use crate::storage::{BlockIndex, HeaderRecord, Record, TxRecord};

#[derive(Parser)]
#[command(name = "blkscan")]
#[command(about = "Decode block files and resolve block heights", long_about = None)]
pub struct Cli {
    /// Network the block files belong to
    #[arg(short, long, value_enum, default_value_t = Network::Main, global = true)]
    pub network: Network,

    /// Data directory holding the network's block files (default: ~/.bitcoin)
    #[arg(long, global = true)]
    pub datadir: Option<PathBuf>,

    /// Directory of the block index
    #[arg(long, default_value = "./index", global = true)]
    pub index: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan all block files and index headers and transactions
    Scan {
        /// Print every header and transaction as a JSON line
        #[arg(long)]
        json: bool,

        /// Don't write the block index
        #[arg(long)]
        no_index: bool,
    },

    /// Show block index info
    Info,

    /// Get an indexed block header by hash or height
    Block {
        /// Block hash or height
        id: String,
    },

    /// Get an indexed transaction
    Tx {
        /// Transaction id
        txid: String,
    },

    /// Decode a raw 80-byte block header given as hex
    DecodeHeader {
        hex: String,
        /// Declared block size to attach
        #[arg(long, default_value = "0")]
        size: u32,
    },

    /// Decode a raw transaction given as hex
    DecodeTx { hex: String },
}

/// Writes records as JSON lines
pub struct JsonLines<W: Write> {
    out: W,
}

impl<W: Write> JsonLines<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write(&mut self, record: &Record) -> Result<(), String> {
        serde_json::to_writer(&mut self.out, record).map_err(|e| format!("Failed to write record: {}", e))?;
        writeln!(self.out).map_err(|e| format!("Failed to write record: {}", e))
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Scan output destinations
struct Sinks<W: Write> {
    printer: Option<JsonLines<W>>,
    index: Option<BlockIndex>,
}

impl<W: Write> Consumer for Sinks<W> {
    fn on_block_header(&mut self, header: BlockHeader) -> Result<(), String> {
        let record = HeaderRecord::from(&header);
        if let Some(index) = &self.index {
            index.store_header(&record)?;
        }
        if let Some(printer) = &mut self.printer {
            printer.write(&Record::Header(record))?;
        }
        Ok(())
    }

    fn on_transaction(&mut self, tx: Transaction) -> Result<(), String> {
        let record = TxRecord::from(&tx);
        if let Some(index) = &self.index {
            index.store_tx(&record)?;
        }
        if let Some(printer) = &mut self.printer {
            printer.write(&Record::Tx(record))?;
        }
        Ok(())
    }
}

/// CLI handler
pub struct CliHandler {
    config: ScanConfig,
    index_path: PathBuf,
}

impl CliHandler {
    /// Create a new CLI handler
    pub fn new(network: Network, datadir: Option<PathBuf>, index_path: PathBuf) -> Self {
        Self {
            config: ScanConfig::new(network, datadir),
            index_path,
        }
    }

    fn open_index(&self) -> Result<BlockIndex, String> {
        log::info!("Opening block index at {}", self.index_path.display());
        BlockIndex::new(&self.index_path)
    }

    /// Handle CLI command
    pub async fn handle(&self, command: Commands) -> Result<(), String> {
        match command {
            Commands::Scan { json, no_index } => self.scan(json, no_index).await,
            Commands::Info => self.info(),
            Commands::Block { id } => self.block(&id),
            Commands::Tx { txid } => self.tx(&txid),
            Commands::DecodeHeader { hex, size } => {
                print_json(&Record::Header(decode_header_hex(&hex, size)?))
            }
            Commands::DecodeTx { hex } => print_json(&Record::Tx(decode_tx_hex(&hex)?)),
        }
    }

    /// Scan every block file of the configured network
    async fn scan(&self, json: bool, no_index: bool) -> Result<(), String> {
        let files = self.config.archive_files().map_err(|e| e.to_string())?;
        log::info!(
            "Scanning {} block files of {} in {}",
            files.len(),
            self.config.network,
            self.config.blocks_dir().display()
        );

        let sinks = Sinks {
            printer: json.then(|| JsonLines::new(io::stdout())),
            index: if no_index { None } else { Some(self.open_index()?) },
        };

        // sinks run inside the scanner, so a failed write names its file and block
        let (summary, sinks) = run_scan(self.config.network, files, sinks)
            .await
            .map_err(|e| e.to_string())?;

        if let Some(index) = &sinks.index {
            index.flush()?;
        }

        log::info!(
            "Scanned {} files: {} blocks, {} transactions, {} resolved, {} orphans",
            summary.files,
            summary.blocks,
            summary.transactions,
            summary.resolved,
            summary.orphans
        );
        if !json {
            println!("Scan complete:");
            println!("  Files: {}", summary.files);
            println!("  Blocks: {}", summary.blocks);
            println!("  Transactions: {}", summary.transactions);
            println!("  Resolved headers: {}", summary.resolved);
            println!("  Orphan headers: {}", summary.orphans);
        }

        Ok(())
    }

    /// Get block index info
    fn info(&self) -> Result<(), String> {
        let index = self.open_index()?;

        println!("Block index info:");
        match index.get_chain_height()? {
            Some(height) => println!("  Height: {}", height),
            None => println!("  Height: none (empty index)"),
        }
        if let Some(hash) = index.get_tip()? {
            println!("  Best block: {}", hash);
        }
        println!("  Transactions: {}", index.tx_count());

        Ok(())
    }

    fn block(&self, id: &str) -> Result<(), String> {
        let index = self.open_index()?;
        match find_block(&index, id)? {
            Some(record) => {
                print_header(&record);
                Ok(())
            }
            None => Err(format!("Block not found: {}", id)),
        }
    }

    fn tx(&self, txid: &str) -> Result<(), String> {
        let index = self.open_index()?;
        match find_tx(&index, txid)? {
            Some(record) => print_json(&Record::Tx(record)),
            None => Err(format!("Transaction not found: {}", txid)),
        }
    }
}

/// Look up a header by height, then by hash
fn find_block(index: &BlockIndex, id: &str) -> Result<Option<HeaderRecord>, String> {
    // Try parsing as height first
    if let Ok(height) = id.parse::<u32>() {
        if let Some(record) = index.get_header_by_height(height)? {
            return Ok(Some(record));
        }
    }

    // Try as hash
    match Hash256::from_hex(id) {
        Ok(hash) => index.get_header(&hash),
        Err(_) => Ok(None),
    }
}

fn find_tx(index: &BlockIndex, txid: &str) -> Result<Option<TxRecord>, String> {
    let hash = Hash256::from_hex(txid).map_err(|e| format!("Invalid txid: {}", e))?;
    index.get_tx(&hash)
}

fn decode_header_hex(hex: &str, size: u32) -> Result<HeaderRecord, String> {
    let raw = hex::decode(hex.trim()).map_err(|e| format!("Invalid hex: {}", e))?;
    let header = BlockHeader::parse(&raw, size).map_err(|e| e.to_string())?;
    Ok(HeaderRecord::from(&header))
}

fn decode_tx_hex(hex: &str) -> Result<TxRecord, String> {
    let raw = hex::decode(hex.trim()).map_err(|e| format!("Invalid hex: {}", e))?;
    let tx = Transaction::from_bytes(&raw).map_err(|e| e.to_string())?;
    Ok(TxRecord::from(&tx))
}

fn print_json(record: &Record) -> Result<(), String> {
    JsonLines::new(io::stdout().lock()).write(record)
}

/// Print block header information
fn print_header(record: &HeaderRecord) {
    println!("Block:");
    println!("  Hash: {}", record.hash);
    match record.height {
        Some(height) => println!("  Height: {}", height),
        None => println!("  Height: unresolved"),
    }
    println!("  Previous: {}", record.prev_hash);
    println!("  Merkle root: {}", record.merkle_root);
    println!("  Version: {:#x}", record.version);
    println!("  Timestamp: {}", record.timestamp);
    println!("  Bits: {:#010x}", record.bits);
    println!("  Nonce: {}", record.nonce);
    println!("  Size: {}", record.size);
}
