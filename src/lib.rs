// Block file decoding and chain height resolution

pub mod core;
pub mod chain;
pub mod network;
pub mod scan;
pub mod storage;
pub mod config;
pub mod cli;

// Re-exports for convenience
pub use crate::core::{BlockHeader, ByteReader, DecodeError, Hash256, Transaction, TxInput, TxOutput};
pub use crate::chain::HeightResolver;
pub use crate::network::Network;
pub use crate::scan::{run_scan, spawn_scan, Collector, Consumer, ScanError, ScanEvent, ScanSummary, Scanner};
pub use crate::storage::{BlockIndex, HeaderRecord, TxRecord};
pub use crate::config::ScanConfig;
pub use crate::cli::{Cli, CliHandler};
