use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{error, info};

use ots_threshold::KeyPair;

use crate::error::RoundError;
use crate::protocol::messages::{Announce, NodeMessage, RoundReport};
use crate::protocol::node::{NodeState, TrusteeNode};
use crate::protocol::router::Router;
use crate::request::SignedDecryptionRequest;
use crate::roster::Roster;
use crate::tree::Tree;

/// In-process transport: the private key behind every roster address
#[derive(Debug, Clone, Default)]
pub struct Cluster {
    keys: HashMap<String, KeyPair>,
}

impl Cluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: impl Into<String>, keypair: KeyPair) -> Option<KeyPair> {
        self.keys.insert(address.into(), keypair)
    }

    pub fn get(&self, address: &str) -> Option<&KeyPair> {
        self.keys.get(address)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// `n` fresh trustees named `trustee-0 ..`, with the matching roster
    pub fn generate(n: usize) -> (Self, Roster) {
        use crate::roster::ServerIdentity;

        let mut cluster = Self::new();
        let mut list = Vec::with_capacity(n);
        for i in 0..n {
            let keypair = KeyPair::random();
            let address = format!("trustee-{i}");
            list.push(ServerIdentity::new(address.clone(), keypair.public()));
            cluster.insert(address, keypair);
        }
        (cluster, Roster::new(list))
    }
}

/// Channels and keys for one node of a round
pub(crate) struct NodeWiring<M> {
    pub(crate) keypair: KeyPair,
    pub(crate) router: Router<M>,
    pub(crate) inbox: mpsc::Receiver<M>,
}

/// Resolve every tree node's key and build its inbox and downward links.
///
/// Returns the wiring in tree order plus the only sender into the root's
/// inbox. Inboxes hold a single message: the announce from the parent.
pub(crate) fn wire<M>(cluster: &Cluster, tree: &Tree) -> Result<(Vec<NodeWiring<M>>, mpsc::Sender<M>), RoundError> {
    if tree.is_empty() {
        return Err(RoundError::EmptyRoster);
    }

    let keypairs = tree
        .nodes()
        .iter()
        .map(|node| {
            cluster
                .get(&node.identity.address)
                .cloned()
                .ok_or_else(|| RoundError::UnknownTrustee(node.identity.address.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (senders, receivers): (Vec<_>, Vec<_>) = tree.nodes().iter().map(|_| mpsc::channel::<M>(1)).unzip();

    let wiring = tree
        .nodes()
        .iter()
        .zip(keypairs)
        .zip(receivers)
        .map(|((node, keypair), inbox)| NodeWiring {
            keypair,
            router: Router::new(
                node.children
                    .iter()
                    .map(|&child| (child, senders[child].clone()))
                    .collect(),
            ),
            inbox,
        })
        .collect();

    let root_inbox = senders.into_iter().next().ok_or(RoundError::EmptyRoster)?;
    Ok((wiring, root_inbox))
}

/// A running round: the root's report and one task per node.
///
/// Dropping the handle aborts every node task still running.
pub struct RoundHandle<R = RoundReport> {
    report: oneshot::Receiver<R>,
    tasks: JoinSet<(usize, NodeState)>,
}

impl<R> RoundHandle<R> {
    pub(crate) fn new(report: oneshot::Receiver<R>, tasks: JoinSet<(usize, NodeState)>) -> Self {
        Self { report, tasks }
    }

    /// Wait for the root's report
    pub async fn report(&mut self) -> Result<R, RoundError> {
        (&mut self.report).await.map_err(|_| RoundError::ChannelClosed)
    }

    /// Wait for every node task; final states in tree order
    pub async fn join(mut self) -> Vec<(usize, NodeState)> {
        let mut states = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(state) => states.push(state),
                Err(e) => error!("trustee task ended abnormally: {}", e),
            }
        }
        states.sort_by_key(|(position, _)| *position);
        states
    }
}

/// Spawn one task per tree node and announce `request` at the root.
///
/// The handle yields the root's report once every node has replied.
/// Must be called from within a tokio runtime.
pub fn start_round(
    cluster: &Cluster,
    tree: &Tree,
    request: SignedDecryptionRequest,
) -> Result<RoundHandle, RoundError> {
    let (wiring, root_inbox) = wire::<NodeMessage>(cluster, tree)?;
    let (report_tx, report_rx) = oneshot::channel();
    let mut report_tx = Some(report_tx);

    info!(
        root = tree.root_index(),
        nodes = tree.len(),
        depth = tree.depth(),
        "starting decryption round"
    );

    let mut tasks = JoinSet::new();
    for (node, parts) in tree.nodes().iter().zip(wiring) {
        let trustee = TrusteeNode {
            position: node.position,
            parent: node.parent,
            router: Some(parts.router),
            keypair: parts.keypair,
            inbox: parts.inbox,
            report: if node.is_root() { report_tx.take() } else { None },
            state: NodeState::Idle,
        };
        let position = node.position;
        tasks.spawn(async move { (position, trustee.run().await) });
    }

    let announce = Announce {
        request: Arc::new(request),
        root_index: tree.root_index(),
        reply_to: None,
    };
    if root_inbox.try_send(NodeMessage::Announce(announce)).is_err() {
        return Err(RoundError::ChannelClosed);
    }
    Ok(RoundHandle::new(report_rx, tasks))
}
