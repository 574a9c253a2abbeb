//! Writer-side share setup and payload sealing.

use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroize;

use ots_ledger::WriteRecord;
use ots_threshold::pvss::{enc_shares, random_secret};
use ots_threshold::serde_utils::point_to_bytes;
use ots_threshold::{Fr, G1Affine, KeyPair, PubVerShare, generator, point_for_key};

use crate::error::{RecoveryError, SetupError};

const PAYLOAD_KEY_CONTEXT: &str = "ots-payload-key-v1";

/// Threshold for `n` trustees: `⌊2n/3⌋ + 1`
pub fn threshold_for(n: usize) -> usize {
    2 * n / 3 + 1
}

/// PVSS parameters and shares for one write.
///
/// `enc_shares`, `enc_proofs` and `pub_keys` are index-aligned in roster
/// order. The dealer secret lives here only until the payload is sealed.
pub struct ThresholdConfig {
    pub n: usize,
    pub threshold: usize,
    pub g: G1Affine,
    pub h: G1Affine,
    pub pub_keys: Vec<G1Affine>,
    pub enc_shares: Vec<PubVerShare>,
    pub enc_proofs: Vec<G1Affine>,
    reader: G1Affine,
    secret: Option<Fr>,
}

impl ThresholdConfig {
    /// Share a fresh secret among `pub_keys` for the given reader
    pub fn setup(pub_keys: &[G1Affine], reader: &G1Affine) -> Result<Self, SetupError> {
        Self::setup_with(pub_keys, reader, &mut rand::thread_rng())
    }

    pub fn setup_with<R: RngCore>(
        pub_keys: &[G1Affine],
        reader: &G1Affine,
        rng: &mut R,
    ) -> Result<Self, SetupError> {
        let n = pub_keys.len();
        if n == 0 {
            return Err(SetupError::NoTrustees);
        }
        let threshold = threshold_for(n);
        let h = point_for_key(reader);
        let secret = random_secret(rng);
        let (shares, proofs) = enc_shares(&h, pub_keys, &secret, threshold, rng)?;

        debug!(n, threshold, "dealt encrypted shares");
        Ok(Self {
            n,
            threshold,
            g: generator(),
            h,
            pub_keys: pub_keys.to_vec(),
            enc_shares: shares,
            enc_proofs: proofs,
            reader: *reader,
            secret: Some(secret),
        })
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Encrypt `plaintext` under a key derived from `G * secret`, then erase
    /// the secret.
    pub fn seal_payload(&mut self, plaintext: &[u8]) -> Result<SealedPayload, SetupError> {
        let mut secret = self.secret.take().ok_or(SetupError::SecretErased)?;
        let point: G1Affine = (self.g * secret).into();
        secret.zeroize();

        let mut key = payload_key(&point);
        let cipher = ChaCha20Poly1305::new_from_slice(&key).map_err(|_| SetupError::Payload)?;
        key.zeroize();

        let mut nonce = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| SetupError::Payload)?;

        Ok(SealedPayload { nonce, ciphertext })
    }

    /// Snapshot for the ledger, signed by `writer`
    pub fn to_write_record(&self, sealed: &SealedPayload, writer: &KeyPair) -> WriteRecord {
        WriteRecord {
            g: self.g,
            h: self.h,
            threshold: self.threshold as u32,
            pub_keys: self.pub_keys.clone(),
            enc_shares: self.enc_shares.clone(),
            enc_proofs: self.enc_proofs.clone(),
            hash_enc: sealed.hash(),
            reader: self.reader,
            writer: writer.public(),
            writer_signature: None,
        }
        .sign(writer)
    }
}

impl Drop for ThresholdConfig {
    fn drop(&mut self) {
        if let Some(secret) = self.secret.as_mut() {
            secret.zeroize();
        }
    }
}

/// The payload as stored off-ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPayload {
    #[serde(with = "hex::serde")]
    pub nonce: [u8; 12],
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.nonce);
        hasher.update(&self.ciphertext);
        hasher.finalize().into()
    }
}

/// Check a sealed payload against the hash committed in the write
pub fn verify_payload_hash(write: &WriteRecord, sealed: &SealedPayload) -> bool {
    write.hash_enc == sealed.hash()
}

/// Decrypt a sealed payload with the recovered point `G * secret`
pub fn open_payload(secret_point: &G1Affine, sealed: &SealedPayload) -> Result<Vec<u8>, RecoveryError> {
    let key = payload_key(secret_point);
    let cipher = ChaCha20Poly1305::new_from_slice(&key).map_err(|_| RecoveryError::Payload)?;
    cipher
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
        .map_err(|_| RecoveryError::Payload)
}

fn payload_key(point: &G1Affine) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(PAYLOAD_KEY_CONTEXT);
    hasher.update(&point_to_bytes(point));
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trustees(n: usize) -> Vec<G1Affine> {
        (0..n).map(|_| KeyPair::random().public()).collect()
    }

    #[test]
    fn test_threshold_formula() {
        assert_eq!(threshold_for(1), 1);
        assert_eq!(threshold_for(3), 3);
        assert_eq!(threshold_for(4), 3);
        assert_eq!(threshold_for(7), 5);
        assert_eq!(threshold_for(10), 7);
    }

    #[test]
    fn test_setup_aligns_vectors() {
        let reader = KeyPair::random();
        let cfg = ThresholdConfig::setup(&trustees(7), &reader.public()).unwrap();
        assert_eq!(cfg.n, 7);
        assert_eq!(cfg.threshold, 5);
        assert_eq!(cfg.enc_shares.len(), 7);
        assert_eq!(cfg.enc_proofs.len(), 7);
        assert_eq!(cfg.h, point_for_key(&reader.public()));
        for (i, share) in cfg.enc_shares.iter().enumerate() {
            assert_eq!(share.index as usize, i);
        }
    }

    #[test]
    fn test_no_trustees() {
        let reader = KeyPair::random();
        assert_eq!(
            ThresholdConfig::setup(&[], &reader.public()).err(),
            Some(SetupError::NoTrustees)
        );
    }

    #[test]
    fn test_secret_is_single_use() {
        let reader = KeyPair::random();
        let mut cfg = ThresholdConfig::setup(&trustees(4), &reader.public()).unwrap();
        assert!(cfg.seal_payload(b"first").is_ok());
        assert!(!cfg.has_secret());
        assert_eq!(cfg.seal_payload(b"second"), Err(SetupError::SecretErased));
    }

    #[test]
    fn test_hash_enc_binds_ciphertext() {
        let reader = KeyPair::random();
        let mut cfg = ThresholdConfig::setup(&trustees(4), &reader.public()).unwrap();
        let mut sealed = cfg.seal_payload(b"payload").unwrap();
        let writer = KeyPair::random();
        let write = cfg.to_write_record(&sealed, &writer);
        assert!(verify_payload_hash(&write, &sealed));
        assert_eq!(write.writer, writer.public());
        assert!(write.verify_writer_signature());

        sealed.ciphertext[0] ^= 1;
        assert!(!verify_payload_hash(&write, &sealed));
    }
}
