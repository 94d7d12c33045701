// Scan configuration: which network, and where its block files live

use std::path::{Path, PathBuf};

use crate::network::Network;
use crate::scan::ScanError;

/// Location of the block archives of one network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub network: Network,
    /// Base data directory, e.g. `~/.bitcoin`
    pub datadir: PathBuf,
}

impl ScanConfig {
    pub fn new(network: Network, datadir: Option<PathBuf>) -> Self {
        Self {
            network,
            datadir: datadir.unwrap_or_else(default_datadir),
        }
    }

    /// `<datadir>/<network dir>/blocks`
    pub fn blocks_dir(&self) -> PathBuf {
        let dir = self.network.dir_name();
        if dir.is_empty() {
            self.datadir.join("blocks")
        } else {
            self.datadir.join(dir).join("blocks")
        }
    }

    /// Block files of the configured network, in scan order
    pub fn archive_files(&self) -> Result<Vec<PathBuf>, ScanError> {
        archive_files(&self.blocks_dir())
    }
}

/// `$HOME/.bitcoin`, or `.bitcoin` in the working directory without a home
pub fn default_datadir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".bitcoin"),
        None => PathBuf::from(".bitcoin"),
    }
}

/// List `blkNNNNN.dat` files in `dir`, ordered by their number
pub fn archive_files(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let io_err = |source| ScanError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let index = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(archive_index);
        if let Some(index) = index {
            files.push((index, path));
        }
    }

    if files.is_empty() {
        return Err(ScanError::NoArchives(dir.to_path_buf()));
    }

    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Number of a `blk<digits>.dat` file name
fn archive_index(name: &str) -> Option<u64> {
    let digits = name.strip_prefix("blk")?.strip_suffix(".dat")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
