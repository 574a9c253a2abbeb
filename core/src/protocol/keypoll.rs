//! Key collection round.
//!
//! The root polls the tree and every trustee answers with the public key it
//! actually holds. Writers run it before setup so shares are dealt to keys
//! the trustees can decrypt with.

use std::collections::HashSet;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use ots_threshold::G1Affine;

use crate::error::RoundError;
use crate::protocol::node::NodeState;
use crate::protocol::round::{Cluster, RoundHandle, wire};
use crate::protocol::router::Router;
use crate::slot::tree_position_to_slot;
use crate::tree::Tree;

#[derive(Debug, Clone)]
pub enum PollMessage {
    Poll(Poll),
    Keys(KeyReply),
}

#[derive(Debug, Clone)]
pub struct Poll {
    pub root_index: usize,
    /// Unset for the root
    pub reply_to: Option<mpsc::Sender<PollMessage>>,
}

#[derive(Debug, Clone)]
pub struct KeyReply {
    /// Tree position of the sender
    pub from: usize,
    /// `(slot, key)` for the sender and its subtree
    pub keys: Vec<(usize, G1Affine)>,
}

/// Keys gathered by the root, sorted by slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPollReport {
    pub root_index: usize,
    pub keys: Vec<(usize, G1Affine)>,
}

impl KeyPollReport {
    /// One key per slot of an `n`-trustee roster, or `None` if a slot is
    /// missing or answered twice
    pub fn publics(&self, n: usize) -> Option<Vec<G1Affine>> {
        if self.keys.len() != n {
            return None;
        }
        self.keys
            .iter()
            .enumerate()
            .map(|(i, (slot, key))| (*slot == i).then_some(*key))
            .collect()
    }
}

struct PollNode {
    position: usize,
    parent: Option<usize>,
    router: Option<Router<PollMessage>>,
    public: G1Affine,
    inbox: mpsc::Receiver<PollMessage>,
    report: Option<oneshot::Sender<KeyPollReport>>,
}

impl PollNode {
    async fn run(mut self) -> NodeState {
        let poll = loop {
            match self.inbox.recv().await {
                Some(PollMessage::Poll(poll)) => break poll,
                Some(PollMessage::Keys(reply)) => {
                    warn!(position = self.position, from = reply.from, "keys before poll, dropped")
                }
                None => {
                    warn!(position = self.position, "inbox closed before poll");
                    return NodeState::Failed;
                }
            }
        };

        let (reply_tx, mut replies) = mpsc::channel(self.router.as_ref().map_or(0, Router::len).max(1));
        let mut pending = match self.router.take() {
            Some(router) => {
                router
                    .fan_out(self.position, || {
                        PollMessage::Poll(Poll {
                            root_index: poll.root_index,
                            reply_to: Some(reply_tx.clone()),
                        })
                    })
                    .await
            }
            None => HashSet::new(),
        };
        drop(reply_tx);

        let mut keys = vec![(tree_position_to_slot(self.position, poll.root_index), self.public)];
        while !pending.is_empty() {
            match replies.recv().await {
                Some(PollMessage::Keys(reply)) if pending.remove(&reply.from) => keys.extend(reply.keys),
                Some(_) => warn!(position = self.position, "unexpected message on the reply channel"),
                None => {
                    error!(position = self.position, missing = pending.len(), "children gone without keys");
                    break;
                }
            }
        }

        match (self.parent, poll.reply_to) {
            (Some(_), Some(tx)) => {
                let reply = KeyReply {
                    from: self.position,
                    keys,
                };
                if tx.send(PollMessage::Keys(reply)).await.is_err() {
                    error!(position = self.position, "failed to send keys to parent");
                    return NodeState::Failed;
                }
            }
            (Some(_), None) => {
                error!(position = self.position, "poll carried no reply channel");
                return NodeState::Failed;
            }
            (None, _) => {
                keys.sort_by_key(|(slot, _)| *slot);
                debug!(keys = keys.len(), "key poll complete at root");
                let report = KeyPollReport {
                    root_index: poll.root_index,
                    keys,
                };
                if let Some(tx) = self.report.take() {
                    if tx.send(report).is_err() {
                        warn!("key poll receiver dropped");
                    }
                }
            }
        }
        NodeState::Done
    }
}

/// Spawn one task per tree node and poll every trustee for its public key
pub fn start_keypoll(cluster: &Cluster, tree: &Tree) -> Result<RoundHandle<KeyPollReport>, RoundError> {
    let (wiring, root_inbox) = wire::<PollMessage>(cluster, tree)?;
    let (report_tx, report_rx) = oneshot::channel();
    let mut report_tx = Some(report_tx);

    info!(root = tree.root_index(), nodes = tree.len(), "starting key poll");

    let mut tasks = JoinSet::new();
    for (node, parts) in tree.nodes().iter().zip(wiring) {
        let poller = PollNode {
            position: node.position,
            parent: node.parent,
            router: Some(parts.router),
            public: parts.keypair.public(),
            inbox: parts.inbox,
            report: if node.is_root() { report_tx.take() } else { None },
        };
        let position = node.position;
        tasks.spawn(async move { (position, poller.run().await) });
    }

    let poll = Poll {
        root_index: tree.root_index(),
        reply_to: None,
    };
    if root_inbox.try_send(PollMessage::Poll(poll)).is_err() {
        return Err(RoundError::ChannelClosed);
    }
    Ok(RoundHandle::new(report_rx, tasks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ots_threshold::KeyPair;

    #[test]
    fn test_publics_needs_every_slot_once() {
        let keys: Vec<G1Affine> = (0..3).map(|_| KeyPair::random().public()).collect();
        let mut report = KeyPollReport {
            root_index: 1,
            keys: keys.iter().copied().enumerate().collect(),
        };
        assert_eq!(report.publics(3), Some(keys.clone()));
        assert_eq!(report.publics(4), None);

        report.keys[2].0 = 1;
        assert_eq!(report.publics(3), None);
    }

    #[tokio::test]
    async fn test_every_poller_ends_done() {
        let (cluster, roster) = Cluster::generate(6);
        let tree = Tree::with_root(&roster, 3, 2).unwrap();

        let mut round = start_keypoll(&cluster, &tree).unwrap();
        let report = round.report().await.unwrap();
        assert_eq!(report.root_index, 3);
        assert_eq!(report.publics(6), Some(roster.publics()));
        assert!(round.join().await.iter().all(|(_, state)| *state == NodeState::Done));
    }
}
