//! The reader's signed decryption request.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use ots_ledger::{BlockHeader, ForwardLink};
use ots_threshold::schnorr::{self, Signature};
use ots_threshold::serde_utils::{hex_points, point_to_bytes};
use ots_threshold::{G1Affine, KeyPair};

/// Write and read headers, the forward link from write to read, and the keys
/// of the committee that signed that link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionRequest {
    pub write: BlockHeader,
    pub read: BlockHeader,
    pub proof: ForwardLink,
    #[serde(with = "hex_points")]
    pub committee: Vec<G1Affine>,
}

impl DecryptionRequest {
    /// Canonical encoding covered by the reader's signature
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        put_chunk(&mut out, &self.write.to_bytes());
        put_chunk(&mut out, &self.read.to_bytes());
        out.extend_from_slice(self.proof.from.as_bytes());
        out.extend_from_slice(self.proof.hash.as_bytes());
        out.extend_from_slice(&self.proof.signature.to_bytes());
        out.extend_from_slice(&(self.committee.len() as u32).to_be_bytes());
        for key in &self.committee {
            out.extend_from_slice(&point_to_bytes(key));
        }
        out
    }

    pub fn digest(&self) -> [u8; 32] {
        Sha256::digest(self.to_bytes()).into()
    }

    pub fn sign(self, reader: &KeyPair) -> SignedDecryptionRequest {
        let signature = schnorr::sign(reader, &self.digest());
        SignedDecryptionRequest {
            request: self,
            signature,
        }
    }
}

fn put_chunk(out: &mut Vec<u8>, chunk: &[u8]) {
    out.extend_from_slice(&(chunk.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk);
}

/// Immutable once signed; shared by reference across the round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedDecryptionRequest {
    pub request: DecryptionRequest,
    pub signature: Signature,
}
