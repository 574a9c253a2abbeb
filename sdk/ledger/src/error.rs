use thiserror::Error;

use crate::block::BlockHash;
use crate::payload::DecodeError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("unknown block {0}")]
    UnknownBlock(BlockHash),

    #[error("block {0} is not a write")]
    NotAWrite(BlockHash),

    /// The read was signed by a key other than the write's reader
    #[error("access denied for reader on write {0}")]
    AccessDenied(BlockHash),

    #[error("read signature rejected")]
    BadReaderSignature,

    #[error("write is not signed by its writer key")]
    BadWriterSignature,

    #[error("invalid write: {0}")]
    InvalidWrite(String),

    #[error("encrypted shares failed verification: {valid} of {n} valid")]
    InvalidShares { valid: usize, n: usize },

    /// Asked for a link to a block that is not after the source block
    #[error("block {target} does not follow block {source_index}")]
    NoForwardLink { source_index: u64, target: u64 },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("crypto: {0}")]
    Crypto(#[from] ots_threshold::ThresholdError),
}
