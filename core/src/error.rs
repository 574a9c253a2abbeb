//! Error taxonomy
//!
//! One enum per concern. Authorization failures travel through the protocol
//! as data (see `protocol::messages::SlotOutcome`); the rest surface to the
//! caller of the operation that failed.

use std::time::Duration;

use thiserror::Error;

use ots_ledger::{DecodeError, LedgerError};
use ots_threshold::ThresholdError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("no trustees")]
    NoTrustees,

    #[error("sharing failed: {0}")]
    Sharing(#[from] ThresholdError),

    /// The dealer secret is erased once the payload is sealed
    #[error("dealer secret already used")]
    SecretErased,

    #[error("payload encryption failed")]
    Payload,
}

/// Why a trustee refused to decrypt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A ledger payload in the request does not decode to the expected record
    #[error("malformed request: {0}")]
    Malformed(#[from] DecodeError),

    #[error("request signature does not verify under the write's reader key")]
    BadRequestSignature,

    /// The write's `H` is not the point derived from its reader key
    #[error("write generator is not bound to its reader key")]
    UnboundGenerator,

    #[error("inclusion proof hash does not match the read block")]
    HashMismatch,

    #[error("request committee differs from the read block's roster")]
    CommitteeMismatch,

    #[error("inclusion proof is not signed by the access committee")]
    BadCommitteeSignature,

    #[error("read does not reference the supplied write")]
    InconsistentLedgerLink,
}

/// Sealing or opening a share for transport to the reader
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("share encoding: {0}")]
    Encoding(String),

    #[error("share ciphertext too short")]
    Truncated,

    #[error("share encryption failed")]
    Seal,

    #[error("share decryption failed")]
    Open,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoundError {
    #[error("roster is empty")]
    EmptyRoster,

    #[error("root index {root} out of range for {n} trustees")]
    RootOutOfRange { root: usize, n: usize },

    #[error("branching factor must be at least 1")]
    InvalidBranching,

    /// The local cluster has no key for a roster address
    #[error("no trustee key for {0}")]
    UnknownTrustee(String),

    #[error("key poll answered for {got} of {n} trustees")]
    IncompleteKeyPoll { got: usize, n: usize },

    #[error("round channel closed before the report was delivered")]
    ChannelClosed,

    #[error("round timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("insufficient shares: got {got}, need {need}")]
    InsufficientShares { got: usize, need: usize },

    /// Too few shares, and trustees refused the request
    #[error("unauthorized: {0}")]
    Unauthorized(AuthError),

    #[error("threshold: {0}")]
    Threshold(#[from] ThresholdError),

    #[error("write record is not signed by its writer")]
    BadWriterSignature,

    #[error("payload hash does not match the write record")]
    PayloadHashMismatch,

    #[error("payload decryption failed")]
    Payload,
}

/// Top-level error for callers that drive a whole flow
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtsError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Round(#[from] RoundError),

    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    #[error(transparent)]
    Relay(#[from] RelayError),
}
