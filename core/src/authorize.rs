//! Request authorization, run independently by every trustee.
//!
//! Checks, in order:
//! 1. both ledger payloads decode (write and read records),
//! 2. the request signature verifies under the reader key of the write,
//! 3. the write's `H` is the point derived from that reader key,
//! 4. the inclusion proof hash is the read block's hash,
//! 5. the committee keys are the read block's roster and sign the proof,
//! 6. the read references the supplied write.

use tracing::debug;

use ots_ledger::{LedgerPayload, ReadRecord, WriteRecord};
use ots_threshold::{G1Affine, cosi, point_for_key, schnorr};

use crate::error::AuthError;
use crate::request::SignedDecryptionRequest;

/// Decoded records of a request that passed every check
#[derive(Debug, Clone)]
pub struct Authorized {
    pub write: WriteRecord,
    pub read: ReadRecord,
    /// `H` as derived from the write's reader key
    pub h: G1Affine,
}

pub fn verify(signed: &SignedDecryptionRequest) -> Result<Authorized, AuthError> {
    let req = &signed.request;
    let write = LedgerPayload::decode_write(&req.write.data)?;
    let read = LedgerPayload::decode_read(&req.read.data)?;

    schnorr::verify(&write.reader, &req.digest(), &signed.signature)
        .map_err(|_| AuthError::BadRequestSignature)?;

    let h = point_for_key(&write.reader);
    if h != write.h {
        return Err(AuthError::UnboundGenerator);
    }

    if req.proof.hash != req.read.hash() {
        return Err(AuthError::HashMismatch);
    }
    if req.committee != req.read.roster {
        return Err(AuthError::CommitteeMismatch);
    }
    cosi::verify(&req.committee, req.proof.hash.as_bytes(), &req.proof.signature)
        .map_err(|_| AuthError::BadCommitteeSignature)?;

    if read.data_id != req.write.hash() {
        return Err(AuthError::InconsistentLedgerLink);
    }

    debug!(read = %req.proof.hash, "request authorized");
    Ok(Authorized { write, read, h })
}
