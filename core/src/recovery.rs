//! Client-side share unwrapping and secret reconstruction.

use tracing::{debug, warn};

use ots_ledger::WriteRecord;
use ots_threshold::pvss::{recover_secret, verify_dec_share};
use ots_threshold::{G1Affine, KeyPair, PubVerShare, ThresholdError};

use crate::error::RecoveryError;
use crate::protocol::RoundReport;
use crate::reencrypt;
use crate::setup::{SealedPayload, open_payload, verify_payload_hash};

/// Open every sealed share in `report` and keep the ones that verify.
///
/// The result is index-aligned with the write's trustee keys; a slot is
/// `None` when its share is missing, empty, unreadable, or fails its proof.
pub fn open_shares(report: &RoundReport, reader: &KeyPair, write: &WriteRecord) -> Vec<Option<PubVerShare>> {
    let n = write.n();
    let mut dec_shares: Vec<Option<PubVerShare>> = vec![None; n];
    let mut seen = vec![false; n];

    for sealed in &report.shares {
        let slot = sealed.slot;
        if slot >= n {
            warn!(slot, n, "share for unknown slot ignored");
            continue;
        }
        if std::mem::replace(&mut seen[slot], true) {
            warn!(slot, "duplicate share ignored");
            continue;
        }
        if sealed.is_empty() {
            debug!(slot, "trustee could not decrypt its share");
            continue;
        }

        let share = match reencrypt::open(&sealed.ciphertext, &write.pub_keys[slot], reader) {
            Ok(share) => share,
            Err(error) => {
                warn!(slot, %error, "could not open share");
                continue;
            }
        };
        if share.index as usize != slot {
            warn!(slot, index = share.index, "share index does not match its slot");
            continue;
        }
        if let Err(error) = verify_dec_share(&write.g, &write.pub_keys[slot], &write.enc_shares[slot], &share) {
            warn!(slot, %error, "share proof rejected");
            continue;
        }
        dec_shares[slot] = Some(share);
    }
    dec_shares
}

/// Recover `G * secret` from a round report.
///
/// The write must carry a valid writer signature.
pub fn recover(report: &RoundReport, reader: &KeyPair, write: &WriteRecord) -> Result<G1Affine, RecoveryError> {
    if !write.verify_writer_signature() {
        return Err(RecoveryError::BadWriterSignature);
    }
    let n = write.n();
    let t = write.threshold as usize;
    let dec_shares = open_shares(report, reader, write);
    let got = dec_shares.iter().filter(|s| s.is_some()).count();

    if got < t {
        if let Some(failure) = report.failures.first() {
            return Err(RecoveryError::Unauthorized(failure.error.clone()));
        }
        return Err(RecoveryError::InsufficientShares { got, need: t });
    }

    recover_secret(&write.g, &write.pub_keys, &write.enc_shares, &dec_shares, t, n).map_err(|e| match e {
        ThresholdError::InsufficientShares { got, need } => RecoveryError::InsufficientShares { got, need },
        other => RecoveryError::Threshold(other),
    })
}

/// Check the sealed payload against the write, then decrypt it
pub fn open_sealed(write: &WriteRecord, sealed: &SealedPayload, secret_point: &G1Affine) -> Result<Vec<u8>, RecoveryError> {
    if !verify_payload_hash(write, sealed) {
        return Err(RecoveryError::PayloadHashMismatch);
    }
    open_payload(secret_point, sealed)
}
