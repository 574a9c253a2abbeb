//! OTS Ledger
//!
//! A minimal skipchain: blocks carry typed write/read payloads, and each
//! block holds collectively signed forward links to every later block. A
//! forward link from a write to a later read is the inclusion proof
//! trustees check before releasing their shares.

pub mod block;
pub mod error;
pub mod ledger;
pub mod payload;

pub use block::{Block, BlockHash, BlockHeader, ForwardLink};
pub use error::LedgerError;
pub use ledger::{LedgerClient, MemoryLedger};
pub use payload::{DecodeError, LedgerPayload, ReadRecord, WriteRecord};
