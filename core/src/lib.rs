//! OTS Core
//!
//! Ledger-authorized release of a threshold-shared secret.
//!
//! ```text
//! writer ── setup ──▶ ledger: write ◀── read ── reader
//!                                          │
//!                     signed request ◀─────┘
//!                           │
//!            ┌──────────────▼──────────────┐
//!            │ trustee tree: every node    │
//!            │ verifies the request, then  │
//!            │ decrypts and seals its share│
//!            └──────────────┬──────────────┘
//!                           ▼
//!                 reader: open, recover G*s, decrypt payload
//! ```

pub mod authorize;
pub mod error;
pub mod protocol;
pub mod recovery;
pub mod reencrypt;
pub mod request;
pub mod roster;
pub mod service;
pub mod setup;
pub mod slot;
pub mod tree;

#[cfg(test)]
mod tests;

pub use error::{AuthError, OtsError, RecoveryError, RelayError, RoundError, SetupError};
pub use protocol::{
    Cluster, KeyPollReport, ReencryptedShare, RoundHandle, RoundReport, SlotFailure, start_keypoll, start_round,
};
pub use request::{DecryptionRequest, SignedDecryptionRequest};
pub use roster::{Roster, ServerIdentity};
pub use service::{DecryptService, RootSelection, RoundSettings};
pub use setup::{SealedPayload, ThresholdConfig, threshold_for};
pub use tree::Tree;
