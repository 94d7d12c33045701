// Scan errors

use std::path::PathBuf;

use thiserror::Error;

use crate::core::DecodeError;
use crate::network::Network;

/// Fatal errors that abort a scan run
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no block files found in {}", .0.display())]
    NoArchives(PathBuf),

    #[error("magic bytes {found:#010x} of block {block} in {file} don't match the network's magic bytes{}",
        matching_network(.matches))]
    MagicMismatch {
        file: String,
        block: usize,
        found: u32,
        matches: Option<Network>,
    },

    #[error("failed to decode block {block} in {file}: {source}")]
    Decode {
        file: String,
        block: usize,
        #[source]
        source: DecodeError,
    },

    #[error("consumer failed at block {block} in {file}: {message}")]
    Consumer {
        file: String,
        block: usize,
        message: String,
    },

    #[error("scan task failed: {0}")]
    Join(String),
}

fn matching_network(matches: &Option<Network>) -> String {
    match matches {
        Some(network) => format!(", they match {}", network),
        None => String::new(),
    }
}
