use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use ots_threshold::CollectiveSignature;
use ots_threshold::G1Affine;
use ots_threshold::serde_utils::{POINT_SIZE, hex_points, point_to_bytes};

// Block header
pub const HEADER_MAGIC: [u8; 4] = *b"OTSB";
pub const HEADER_VERSION: u16 = 1;

/// SHA-256 of a block header's canonical bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockHash(#[serde(with = "hex::serde")] pub [u8; 32]);

impl BlockHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", &hex::encode(self.0)[..16])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub index: u64,
    /// Public keys of the committee that signs links to and from this block
    #[serde(with = "hex_points")]
    pub roster: Vec<G1Affine>,
    pub back_link: BlockHash,
    /// Encoded `LedgerPayload`
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
}

impl BlockHeader {
    /// Canonical encoding: magic, version, index, roster, back link, data.
    /// Variable-length fields carry a big-endian u32 length prefix.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            4 + 2 + 8 + 4 + self.roster.len() * POINT_SIZE + 32 + 4 + self.data.len(),
        );
        out.extend_from_slice(&HEADER_MAGIC);
        out.extend_from_slice(&HEADER_VERSION.to_be_bytes());
        out.extend_from_slice(&self.index.to_be_bytes());
        out.extend_from_slice(&(self.roster.len() as u32).to_be_bytes());
        for key in &self.roster {
            out.extend_from_slice(&point_to_bytes(key));
        }
        out.extend_from_slice(&self.back_link.0);
        out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    pub fn hash(&self) -> BlockHash {
        BlockHash(Sha256::digest(self.to_bytes()).into())
    }
}

/// Proof that the committee approved the block with hash `hash` as a
/// successor of the block with hash `from`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardLink {
    pub from: BlockHash,
    pub hash: BlockHash,
    pub signature: CollectiveSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    /// `forward_links[k]` points at the block `k + 1` positions later
    pub forward_links: Vec<ForwardLink>,
}

impl Block {
    pub fn index(&self) -> u64 {
        self.header.index
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    pub fn forward_link(&self, offset: usize) -> Option<&ForwardLink> {
        self.forward_links.get(offset)
    }
}
