//! Tree-distributed threshold decryption
//!
//! ```text
//!                 ┌────────┐
//!      announce   │  root  │   report
//!     ┌──────────▶│ slot r │──────────▶ client
//!     │           └───┬────┘
//!     │      announce │ ▲ reply: sealed shares
//!     │               ▼ │
//!     │           ┌────────┐
//!     │           │  node  │ verify → decrypt → seal for reader
//!     │           └────────┘
//! ```
//!
//! Each node runs as its own task with a single typed inbox for the
//! announce. Replies come back on a channel created by the parent at
//! fan-out. Relayers only ever hold sealed shares, so neither the root nor
//! any internal node learns another trustee's share.
//!
//! The same tree also runs a key poll (see [`keypoll`]).

pub mod keypoll;
pub mod messages;
pub mod node;
pub mod round;
pub(crate) mod router;

pub use keypoll::{KeyPollReport, start_keypoll};
pub use messages::{
    Announce, NodeMessage, ReencryptedShare, Reply, RoundReport, SlotFailure, SlotOutcome,
};
pub use node::NodeState;
pub use round::{Cluster, RoundHandle, start_round};
