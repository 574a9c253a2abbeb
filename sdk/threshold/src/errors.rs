//! Error type shared by every primitive in this crate.
use thiserror::Error;

/// Errors raised by the sharing, proof and signature primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThresholdError {
    /// Fewer verified shares than the threshold
    #[error("insufficient shares: got {got}, need {need}")]
    InsufficientShares { got: usize, need: usize },

    #[error("invalid threshold: t={t}, n={n}")]
    InvalidThreshold { t: usize, n: usize },

    /// Two shares claim the same evaluation point
    #[error("duplicate share index {0}")]
    DuplicateIndex(u32),

    /// Input slices that must be index-aligned have different lengths
    #[error("length mismatch: {what} has {got} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("share {index}: encrypted share proof rejected")]
    BadEncShare { index: u32 },

    #[error("share {index}: decrypted share proof rejected")]
    BadDecShare { index: u32 },

    #[error("discrete log equality proof rejected")]
    BadProof,

    #[error("signature rejected")]
    BadSignature,

    #[error("empty signer set")]
    EmptySignerSet,

    /// Private key has no inverse
    #[error("degenerate private key")]
    ZeroKey,

    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Result type for threshold primitives
pub type Result<T> = std::result::Result<T, ThresholdError>;
