// Block archive scanning and scan output delivery

mod consumer;
mod error;
mod scanner;

pub use consumer::{ChannelConsumer, Collector, Consumer, ScanEvent};
pub use error::ScanError;
pub use scanner::{run_scan, spawn_scan, ScanSummary, ScanTask, Scanner};
