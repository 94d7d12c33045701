// Receivers of decoded headers and transactions

use tokio::sync::mpsc;

use crate::core::{BlockHeader, Transaction};

/// Downstream receiver of scan output.
///
/// Headers arrive once their height is resolved, transactions in file order.
/// Returning an error aborts the scan.
pub trait Consumer {
    fn on_block_header(&mut self, header: BlockHeader) -> Result<(), String>;

    fn on_transaction(&mut self, tx: Transaction) -> Result<(), String>;
}

impl<C: Consumer + ?Sized> Consumer for &mut C {
    fn on_block_header(&mut self, header: BlockHeader) -> Result<(), String> {
        (**self).on_block_header(header)
    }

    fn on_transaction(&mut self, tx: Transaction) -> Result<(), String> {
        (**self).on_transaction(tx)
    }
}

impl<C: Consumer + ?Sized> Consumer for Box<C> {
    fn on_block_header(&mut self, header: BlockHeader) -> Result<(), String> {
        (**self).on_block_header(header)
    }

    fn on_transaction(&mut self, tx: Transaction) -> Result<(), String> {
        (**self).on_transaction(tx)
    }
}

/// Keeps everything it receives
#[derive(Debug, Default)]
pub struct Collector {
    pub headers: Vec<BlockHeader>,
    pub transactions: Vec<Transaction>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Consumer for Collector {
    fn on_block_header(&mut self, header: BlockHeader) -> Result<(), String> {
        self.headers.push(header);
        Ok(())
    }

    fn on_transaction(&mut self, tx: Transaction) -> Result<(), String> {
        self.transactions.push(tx);
        Ok(())
    }
}

/// One item of scan output
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Header(BlockHeader),
    Transaction(Transaction),
}

impl ScanEvent {
    /// Hand the event to a synchronous consumer
    pub fn deliver<C: Consumer + ?Sized>(self, consumer: &mut C) -> Result<(), String> {
        match self {
            ScanEvent::Header(header) => consumer.on_block_header(header),
            ScanEvent::Transaction(tx) => consumer.on_transaction(tx),
        }
    }
}

/// Forwards events over a bounded channel.
///
/// Sending blocks while the channel is full, so it must run outside of the
/// async runtime (see `spawn_scan`).
#[derive(Debug, Clone)]
pub struct ChannelConsumer {
    sender: mpsc::Sender<ScanEvent>,
}

impl ChannelConsumer {
    pub fn new(sender: mpsc::Sender<ScanEvent>) -> Self {
        Self { sender }
    }

    fn send(&self, event: ScanEvent) -> Result<(), String> {
        self.sender
            .blocking_send(event)
            .map_err(|_| "scan event receiver dropped".to_string())
    }
}

impl Consumer for ChannelConsumer {
    fn on_block_header(&mut self, header: BlockHeader) -> Result<(), String> {
        self.send(ScanEvent::Header(header))
    }

    fn on_transaction(&mut self, tx: Transaction) -> Result<(), String> {
        self.send(ScanEvent::Transaction(tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Hash256;

    #[test]
    fn test_event_delivery() {
        let header = BlockHeader::new(1, Hash256::zero(), Hash256::zero(), 0, 0, 0, 0);
        let mut collector = Collector::new();

        ScanEvent::Header(header.clone()).deliver(&mut collector).unwrap();
        assert_eq!(collector.headers, vec![header]);
        assert!(collector.transactions.is_empty());
    }

    #[test]
    fn test_channel_reports_dropped_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut consumer = ChannelConsumer::new(tx);
        let header = BlockHeader::new(1, Hash256::zero(), Hash256::zero(), 0, 0, 0, 0);
        assert!(consumer.on_block_header(header).is_err());
    }
}
