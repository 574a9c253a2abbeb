use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::AuthError;
use crate::request::SignedDecryptionRequest;

/// The only message types a node's inbox accepts
#[derive(Debug, Clone)]
pub enum NodeMessage {
    Announce(Announce),
    Reply(Reply),
}

/// Sent down the tree; identical for every recipient apart from the reply
/// channel
#[derive(Debug, Clone)]
pub struct Announce {
    pub request: Arc<SignedDecryptionRequest>,
    /// Share slot of the round's root
    pub root_index: usize,
    /// Where the recipient sends its [`Reply`]; unset for the root
    pub reply_to: Option<mpsc::Sender<NodeMessage>>,
}

/// Sent up the tree: the sender's own outcome plus everything its subtree
/// reported
#[derive(Debug, Clone)]
pub struct Reply {
    /// Tree position of the sender
    pub from: usize,
    pub outcomes: Vec<SlotOutcome>,
}

/// A decrypted share sealed for the reader; opaque to every relayer.
///
/// An empty ciphertext means the trustee at `slot` was authorized but could
/// not decrypt its share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReencryptedShare {
    pub slot: usize,
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,
}

impl ReencryptedShare {
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    Share(ReencryptedShare),
    /// The trustee at `slot` refused the request
    Unauthorized { slot: usize, error: AuthError },
}

impl SlotOutcome {
    pub fn slot(&self) -> usize {
        match self {
            SlotOutcome::Share(share) => share.slot,
            SlotOutcome::Unauthorized { slot, .. } => *slot,
        }
    }
}

/// A trustee's refusal as reported to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotFailure {
    pub slot: usize,
    pub error: AuthError,
}

/// What the root hands back once every node has replied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundReport {
    pub root_index: usize,
    pub shares: Vec<ReencryptedShare>,
    pub failures: Vec<SlotFailure>,
}

impl RoundReport {
    pub(crate) fn from_outcomes(root_index: usize, outcomes: Vec<SlotOutcome>) -> Self {
        let mut report = RoundReport {
            root_index,
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                SlotOutcome::Share(share) => report.shares.push(share),
                SlotOutcome::Unauthorized { slot, error } => {
                    report.failures.push(SlotFailure { slot, error })
                }
            }
        }
        report.shares.sort_by_key(|s| s.slot);
        report.failures.sort_by_key(|f| f.slot);
        report
    }

    /// Shares with a non-empty ciphertext
    pub fn usable_shares(&self) -> usize {
        self.shares.iter().filter(|s| !s.is_empty()).count()
    }
}
