// Block archive scanning

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::chain::HeightResolver;
use crate::core::{BlockHeader, ByteReader, DecodeError, Transaction};
use crate::network::Network;
use crate::scan::{ChannelConsumer, Consumer, ScanError, ScanEvent};

/// Totals for a scan run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Archive files read
    pub files: usize,
    /// Block records decoded
    pub blocks: usize,
    pub transactions: usize,
    /// Headers with a resolved height
    pub resolved: usize,
    /// Headers whose parent never showed up
    pub orphans: usize,
}

/// Walks block archives, resolving heights and feeding a consumer.
///
/// One scanner is one run: the height map starts empty and the first
/// header it sees becomes height 0.
pub struct Scanner<C: Consumer> {
    network: Network,
    resolver: HeightResolver,
    consumer: C,
    files: usize,
    blocks: usize,
    transactions: usize,
}

impl<C: Consumer> Scanner<C> {
    pub fn new(network: Network, consumer: C) -> Self {
        Self {
            network,
            resolver: HeightResolver::new(),
            consumer,
            files: 0,
            blocks: 0,
            transactions: 0,
        }
    }

    pub fn resolver(&self) -> &HeightResolver {
        &self.resolver
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    pub fn into_consumer(self) -> C {
        self.consumer
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            files: self.files,
            blocks: self.blocks,
            transactions: self.transactions,
            resolved: self.resolver.resolved_count(),
            orphans: self.resolver.orphan_count(),
        }
    }

    /// Scan archive files in order. Only one file is held in memory at a time.
    pub fn scan_files<P: AsRef<Path>>(&mut self, files: &[P]) -> Result<ScanSummary, ScanError> {
        let total = files.len();

        for (i, path) in files.iter().enumerate() {
            let path = path.as_ref();
            let name = file_label(path);
            log::info!("Parsing {} ({}/{})", name, i + 1, total);

            let buf = std::fs::read(path).map_err(|source| ScanError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            self.scan_buffer(&buf, &name, i + 1 == total)?;

            log::info!(
                "Finished block file, total blocks: {}, orphan blocks: {}",
                self.resolver.resolved_count(),
                self.resolver.orphan_count()
            );
        }

        if self.resolver.orphan_count() > 0 {
            log::warn!(
                "{} block headers were never connected to the chain",
                self.resolver.orphan_count()
            );
        }

        Ok(self.summary())
    }

    /// Scan the block records of one archive held in memory.
    /// Returns the number of records decoded.
    pub fn scan_buffer(&mut self, buf: &[u8], file: &str, is_last: bool) -> Result<usize, ScanError> {
        let mut reader = ByteReader::new(buf);
        let mut block = 0;

        while !reader.is_empty() {
            if !self.scan_record(&mut reader, file, block, is_last)? {
                log::debug!("Zero padding at offset {} of {}", reader.position(), file);
                break;
            }
            block += 1;
        }

        self.files += 1;
        Ok(block)
    }

    /// Decode one `[magic][size][header][txs]` record.
    /// Returns false when the trailing zero padding of the last file is reached.
    fn scan_record(
        &mut self,
        reader: &mut ByteReader<'_>,
        file: &str,
        block: usize,
        is_last: bool,
    ) -> Result<bool, ScanError> {
        let decode_err = |source: DecodeError| ScanError::Decode {
            file: file.to_string(),
            block,
            source,
        };
        let consumer_err = |message: String| ScanError::Consumer {
            file: file.to_string(),
            block,
            message,
        };

        let magic = reader.read_u32_be().map_err(decode_err)?;
        if magic == 0 && is_last {
            return Ok(false);
        }
        if magic != self.network.magic() {
            return Err(ScanError::MagicMismatch {
                file: file.to_string(),
                block,
                found: magic,
                matches: Network::from_magic(magic),
            });
        }

        let size = reader.read_u32_le().map_err(decode_err)?;
        let header = BlockHeader::read(reader, size).map_err(decode_err)?;
        for resolved in self.resolver.admit(header) {
            self.consumer.on_block_header(resolved).map_err(consumer_err)?;
        }

        let tx_count = reader.read_varint_usize().map_err(decode_err)?;
        for _ in 0..tx_count {
            let tx = Transaction::parse(reader).map_err(decode_err)?;
            self.consumer.on_transaction(tx).map_err(consumer_err)?;
            self.transactions += 1;
        }

        self.blocks += 1;
        Ok(true)
    }
}

/// A scan running on a blocking thread, streaming events over a bounded channel
pub struct ScanTask {
    events: mpsc::Receiver<ScanEvent>,
    handle: JoinHandle<Result<ScanSummary, ScanError>>,
}

impl ScanTask {
    /// Next event, or None once the scan has stopped
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        self.events.recv().await
    }

    /// Wait for the scan to end. Call after `next_event` returned None,
    /// otherwise pending events are dropped and the scan aborts.
    pub async fn finish(self) -> Result<ScanSummary, ScanError> {
        drop(self.events);
        self.handle
            .await
            .map_err(|e| ScanError::Join(e.to_string()))?
    }
}

/// Scan `files` on a blocking thread with `consumer` driven by the scanner
/// itself, so consumer failures carry the file and block they happened at.
/// Returns the summary together with the consumer.
pub async fn run_scan<C>(
    network: Network,
    files: Vec<PathBuf>,
    consumer: C,
) -> Result<(ScanSummary, C), ScanError>
where
    C: Consumer + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut scanner = Scanner::new(network, consumer);
        let summary = scanner.scan_files(&files)?;
        Ok((summary, scanner.into_consumer()))
    })
    .await
    .map_err(|e| ScanError::Join(e.to_string()))?
}

/// Start scanning `files` in the background. At most `capacity` events are
/// buffered; decoding pauses until the receiver catches up.
pub fn spawn_scan(network: Network, files: Vec<PathBuf>, capacity: usize) -> ScanTask {
    let (sender, events) = mpsc::channel(capacity.max(1));
    let handle = tokio::task::spawn_blocking(move || {
        let mut scanner = Scanner::new(network, ChannelConsumer::new(sender));
        scanner.scan_files(&files)
    });
    ScanTask { events, handle }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}
