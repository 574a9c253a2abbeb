//! Typed block payloads
//!
//! Block data is the JSON encoding of [`LedgerPayload`], discriminated by a
//! `kind` field. Decoding into the wrong kind is a typed error, never a
//! silently empty record.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use ots_threshold::keys::KeyPair;
use ots_threshold::schnorr::{self, Signature};
use ots_threshold::serde_utils::{hex_point, hex_points, point_to_bytes, scalar_to_bytes};
use ots_threshold::{G1Affine, PubVerShare, point_for_key};

use crate::block::BlockHash;
use crate::error::LedgerError;

const WRITE_SIGNING_DOMAIN: &[u8] = b"ots-write-v1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("expected a {expected} record, found {found}")]
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerPayload {
    Genesis,
    Write(WriteRecord),
    Read(ReadRecord),
}

impl LedgerPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerPayload::Genesis => "genesis",
            LedgerPayload::Write(_) => "write",
            LedgerPayload::Read(_) => "read",
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        // Every field is a string, a number or a sequence of those.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))
    }

    pub fn decode_write(bytes: &[u8]) -> Result<WriteRecord, DecodeError> {
        match Self::decode(bytes)? {
            LedgerPayload::Write(write) => Ok(write),
            other => Err(DecodeError::WrongKind {
                expected: "write",
                found: other.kind(),
            }),
        }
    }

    pub fn decode_read(bytes: &[u8]) -> Result<ReadRecord, DecodeError> {
        match Self::decode(bytes)? {
            LedgerPayload::Read(read) => Ok(read),
            other => Err(DecodeError::WrongKind {
                expected: "read",
                found: other.kind(),
            }),
        }
    }
}

/// Everything a trustee needs to decrypt its share, fixed at write time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRecord {
    #[serde(with = "hex_point")]
    pub g: G1Affine,
    /// Second generator, derived from the reader's key
    #[serde(with = "hex_point")]
    pub h: G1Affine,
    pub threshold: u32,
    #[serde(with = "hex_points")]
    pub pub_keys: Vec<G1Affine>,
    pub enc_shares: Vec<PubVerShare>,
    #[serde(with = "hex_points")]
    pub enc_proofs: Vec<G1Affine>,
    /// SHA-256 of the sealed payload
    #[serde(with = "hex::serde")]
    pub hash_enc: [u8; 32],
    /// The only key allowed to read
    #[serde(with = "hex_point")]
    pub reader: G1Affine,
    #[serde(with = "hex_point")]
    pub writer: G1Affine,
    /// Writer's signature over [`WriteRecord::signing_digest`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer_signature: Option<Signature>,
}

impl WriteRecord {
    pub fn n(&self) -> usize {
        self.pub_keys.len()
    }

    /// Structural checks; share proofs are checked by the ledger separately
    pub fn validate(&self) -> Result<(), LedgerError> {
        let n = self.n();
        if n == 0 {
            return Err(LedgerError::InvalidWrite("no trustees".into()));
        }
        if self.enc_shares.len() != n || self.enc_proofs.len() != n {
            return Err(LedgerError::InvalidWrite(format!(
                "{} keys, {} shares, {} proofs",
                n,
                self.enc_shares.len(),
                self.enc_proofs.len()
            )));
        }
        let t = self.threshold as usize;
        if t == 0 || t > n {
            return Err(LedgerError::InvalidWrite(format!("threshold {t} for {n} trustees")));
        }
        if self.h != point_for_key(&self.reader) {
            return Err(LedgerError::InvalidWrite("H is not bound to the reader key".into()));
        }
        Ok(())
    }

    /// SHA-256 over every field except the writer signature.
    /// Sequences carry a big-endian u32 length prefix.
    pub fn signing_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(WRITE_SIGNING_DOMAIN);
        hasher.update(point_to_bytes(&self.g));
        hasher.update(point_to_bytes(&self.h));
        hasher.update(self.threshold.to_be_bytes());
        hash_points(&mut hasher, &self.pub_keys);
        hasher.update((self.enc_shares.len() as u32).to_be_bytes());
        for share in &self.enc_shares {
            hasher.update(share.index.to_be_bytes());
            hasher.update(point_to_bytes(&share.value));
            hasher.update(scalar_to_bytes(&share.proof.challenge));
            hasher.update(scalar_to_bytes(&share.proof.response));
            hasher.update(point_to_bytes(&share.proof.commit_g));
            hasher.update(point_to_bytes(&share.proof.commit_h));
        }
        hash_points(&mut hasher, &self.enc_proofs);
        hasher.update(self.hash_enc);
        hasher.update(point_to_bytes(&self.reader));
        hasher.update(point_to_bytes(&self.writer));
        hasher.finalize().into()
    }

    /// Set `writer` to the signer's key and sign the record
    pub fn sign(mut self, writer: &KeyPair) -> Self {
        self.writer = writer.public();
        self.writer_signature = Some(schnorr::sign(writer, &self.signing_digest()));
        self
    }

    pub fn verify_writer_signature(&self) -> bool {
        self.writer_signature
            .as_ref()
            .is_some_and(|sig| schnorr::verify(&self.writer, &self.signing_digest(), sig).is_ok())
    }
}

fn hash_points(hasher: &mut Sha256, points: &[G1Affine]) {
    hasher.update((points.len() as u32).to_be_bytes());
    for point in points {
        hasher.update(point_to_bytes(point));
    }
}

/// A reader's claim on a write, signed with the reader's key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRecord {
    /// Hash of the write block
    pub data_id: BlockHash,
    #[serde(with = "hex_point")]
    pub reader: G1Affine,
    pub signature: Signature,
}

impl ReadRecord {
    pub fn new(data_id: BlockHash, reader: &KeyPair) -> Self {
        Self {
            data_id,
            reader: reader.public(),
            signature: schnorr::sign(reader, data_id.as_bytes()),
        }
    }

    pub fn verify_signature(&self) -> bool {
        schnorr::verify(&self.reader, self.data_id.as_bytes(), &self.signature).is_ok()
    }
}
