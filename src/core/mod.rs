// Core data structures and decoders

mod error;
mod types;
mod transaction;
mod block;
mod serialize;
mod hash;

pub use error::DecodeError;
pub use types::*;
pub use transaction::*;
pub use block::*;
pub use serialize::*;
pub use hash::*;
