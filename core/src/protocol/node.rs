//! One trustee's part in a decryption round.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use ots_threshold::pvss::dec_share;
use ots_threshold::{KeyPair, PubVerShare};

use crate::authorize::{self, Authorized};
use crate::error::RelayError;
use crate::protocol::messages::{Announce, NodeMessage, ReencryptedShare, Reply, RoundReport, SlotOutcome};
use crate::protocol::router::Router;
use crate::reencrypt::reencrypt;
use crate::slot::tree_position_to_slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Idle,
    Announced,
    Verifying,
    Decrypting,
    Replied,
    Done,
    Failed,
}

pub(crate) struct TrusteeNode {
    pub(crate) position: usize,
    pub(crate) parent: Option<usize>,
    /// Taken by the fan-out
    pub(crate) router: Option<Router<NodeMessage>>,
    pub(crate) keypair: KeyPair,
    pub(crate) inbox: mpsc::Receiver<NodeMessage>,
    /// Set on the root only
    pub(crate) report: Option<oneshot::Sender<RoundReport>>,
    pub(crate) state: NodeState,
}

impl TrusteeNode {
    /// Drive the node to a terminal state; every path that received an
    /// announce sends exactly one message upward.
    pub(crate) async fn run(mut self) -> NodeState {
        let Some(mut announce) = self.wait_for_announce().await else {
            warn!(position = self.position, "inbox closed before announce");
            self.transition(NodeState::Failed);
            return self.state;
        };
        let reply_to = announce.reply_to.take();
        self.transition(NodeState::Announced);

        let (pending, replies) = self.forward(&announce).await;
        let mut outcomes = self.collect_replies(pending, replies).await;

        let own = self.process(&announce);
        outcomes.push(own);

        let failed = self.state == NodeState::Failed;
        self.deliver(announce.root_index, reply_to, outcomes).await;
        if !failed {
            self.transition(NodeState::Done);
        }
        self.state
    }

    fn transition(&mut self, next: NodeState) {
        debug!(position = self.position, from = ?self.state, to = ?next, "node state");
        self.state = next;
    }

    async fn wait_for_announce(&mut self) -> Option<Announce> {
        while let Some(message) = self.inbox.recv().await {
            match message {
                NodeMessage::Announce(announce) => return Some(announce),
                NodeMessage::Reply(reply) => {
                    warn!(position = self.position, from = reply.from, "reply before announce, dropped")
                }
            }
        }
        None
    }

    /// Announce to every child with a fresh reply channel. Returns the
    /// children that got the announce and the receiving end of that channel.
    async fn forward(&mut self, announce: &Announce) -> (HashSet<usize>, mpsc::Receiver<NodeMessage>) {
        let fan = self.router.as_ref().map_or(0, Router::len);
        let (reply_tx, replies) = mpsc::channel(fan.max(1));
        let pending = match self.router.take() {
            Some(router) => {
                router
                    .fan_out(self.position, || {
                        NodeMessage::Announce(Announce {
                            request: Arc::clone(&announce.request),
                            root_index: announce.root_index,
                            reply_to: Some(reply_tx.clone()),
                        })
                    })
                    .await
            }
            None => HashSet::new(),
        };
        (pending, replies)
    }

    /// Sole suspension point after the announce: one reply per child, until
    /// every child that got the announce has replied or gone away
    async fn collect_replies(
        &mut self,
        mut pending: HashSet<usize>,
        mut replies: mpsc::Receiver<NodeMessage>,
    ) -> Vec<SlotOutcome> {
        let mut outcomes = Vec::new();
        while !pending.is_empty() {
            match replies.recv().await {
                Some(NodeMessage::Reply(reply)) => {
                    if pending.remove(&reply.from) {
                        outcomes.extend(reply.outcomes);
                    } else {
                        warn!(position = self.position, from = reply.from, "unexpected reply, dropped");
                    }
                }
                Some(NodeMessage::Announce(_)) => {
                    warn!(position = self.position, "announce on the reply channel, dropped")
                }
                None => {
                    error!(position = self.position, missing = pending.len(), "children gone without replying");
                    break;
                }
            }
        }
        outcomes
    }

    /// Verify the request, then decrypt and seal this trustee's share
    fn process(&mut self, announce: &Announce) -> SlotOutcome {
        let slot = tree_position_to_slot(self.position, announce.root_index);

        self.transition(NodeState::Verifying);
        let authorized = match authorize::verify(&announce.request) {
            Ok(authorized) => authorized,
            Err(error) => {
                warn!(position = self.position, slot, %error, "request refused");
                self.transition(NodeState::Failed);
                return SlotOutcome::Unauthorized { slot, error };
            }
        };

        self.transition(NodeState::Decrypting);
        let ciphertext = match self.decrypt_and_seal(&authorized, slot) {
            Ok(ciphertext) => ciphertext,
            Err(reason) => {
                warn!(position = self.position, slot, %reason, "share unavailable");
                Vec::new()
            }
        };
        SlotOutcome::Share(ReencryptedShare { slot, ciphertext })
    }

    fn decrypt_and_seal(&self, authorized: &Authorized, slot: usize) -> Result<Vec<u8>, String> {
        let write = &authorized.write;
        if slot >= write.n() || write.enc_proofs.len() != write.n() || write.enc_shares.len() != write.n() {
            return Err(format!("slot {slot} outside write of {} shares", write.n()));
        }
        let share: PubVerShare = dec_share(
            &authorized.h,
            &self.keypair.public(),
            &write.enc_proofs[slot],
            self.keypair.secret(),
            &write.enc_shares[slot],
            &mut rand::thread_rng(),
        )
        .map_err(|e| e.to_string())?;

        reencrypt(&share, &write.reader, &self.keypair).map_err(|e: RelayError| e.to_string())
    }

    async fn deliver(
        &mut self,
        root_index: usize,
        reply_to: Option<mpsc::Sender<NodeMessage>>,
        outcomes: Vec<SlotOutcome>,
    ) {
        match (self.parent, reply_to) {
            (Some(parent), Some(tx)) => {
                let reply = Reply {
                    from: self.position,
                    outcomes,
                };
                if tx.send(NodeMessage::Reply(reply)).await.is_err() {
                    error!(position = self.position, parent, "failed to reply to parent");
                }
            }
            (Some(parent), None) => {
                error!(position = self.position, parent, "announce carried no reply channel");
            }
            (None, _) => {
                let report = RoundReport::from_outcomes(root_index, outcomes);
                debug!(
                    shares = report.shares.len(),
                    failures = report.failures.len(),
                    "round complete at root"
                );
                if let Some(tx) = self.report.take() {
                    if tx.send(report).is_err() {
                        warn!("round report receiver dropped");
                    }
                }
            }
        }
        if self.state != NodeState::Failed {
            self.transition(NodeState::Replied);
        }
    }
}
