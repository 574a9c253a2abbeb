//! Downward links of one tree node.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tracing::error;

/// Senders into the children's inboxes, keyed by tree position.
///
/// Consumed by the single fan-out of a round, so after the announce the only
/// senders into a node's inbox are gone and replies flow on the channel the
/// announce carries.
pub(crate) struct Router<M> {
    links: Vec<(usize, mpsc::Sender<M>)>,
}

impl<M> Router<M> {
    pub(crate) fn new(links: Vec<(usize, mpsc::Sender<M>)>) -> Self {
        Self { links }
    }

    pub(crate) fn len(&self) -> usize {
        self.links.len()
    }

    /// Send one message per child and drop the links; returns the children
    /// that accepted it
    pub(crate) async fn fan_out(self, from: usize, mut message: impl FnMut() -> M) -> HashSet<usize> {
        let mut reached = HashSet::with_capacity(self.links.len());
        for (child, inbox) in self.links {
            if inbox.send(message()).await.is_ok() {
                reached.insert(child);
            } else {
                error!(position = from, child, "child inbox closed");
            }
        }
        reached
    }
}
