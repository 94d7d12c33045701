// Persistent index of scan output

mod block_index;
mod records;

pub use block_index::BlockIndex;
pub use records::{HeaderRecord, Record, TxRecord};
