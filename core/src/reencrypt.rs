//! Per-share transport encryption to the reader.
//!
//! A trustee seals its decrypted share under `reader_pk * trustee_sk`; only
//! the reader, holding `reader_sk`, can recompute `trustee_pk * reader_sk`.
//! Relaying nodes see `nonce || ciphertext` and nothing else.

use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;
use zeroize::Zeroize;

use ots_threshold::serde_utils::point_to_bytes;
use ots_threshold::{Fr, G1Affine, KeyPair, PubVerShare};

use crate::error::RelayError;

const SHARE_KEY_CONTEXT: &str = "ots-reencrypt-share-v1";
const NONCE_SIZE: usize = 12;

/// Seal `share` for the reader
pub fn reencrypt(share: &PubVerShare, reader: &G1Affine, trustee: &KeyPair) -> Result<Vec<u8>, RelayError> {
    let mut plaintext = serde_json::to_vec(share).map_err(|e| RelayError::Encoding(e.to_string()))?;
    let cipher = share_cipher(reader, trustee.secret(), &trustee.public())?;

    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|_| RelayError::Seal);
    plaintext.zeroize();
    let sealed = sealed?;

    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Open a share sealed by the trustee with public key `trustee`
pub fn open(ciphertext: &[u8], trustee: &G1Affine, reader: &KeyPair) -> Result<PubVerShare, RelayError> {
    if ciphertext.len() <= NONCE_SIZE {
        return Err(RelayError::Truncated);
    }
    let (nonce, body) = ciphertext.split_at(NONCE_SIZE);
    let cipher = share_cipher(trustee, reader.secret(), trustee)?;
    let mut plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), body)
        .map_err(|_| RelayError::Open)?;
    let share = serde_json::from_slice(&plaintext).map_err(|e| RelayError::Encoding(e.to_string()));
    plaintext.zeroize();
    share
}

/// Both sides derive the same key from the shared point and the trustee key
fn share_cipher(peer: &G1Affine, own_secret: &Fr, trustee: &G1Affine) -> Result<ChaCha20Poly1305, RelayError> {
    let shared: G1Affine = (*peer * own_secret).into();
    let mut hasher = blake3::Hasher::new_derive_key(SHARE_KEY_CONTEXT);
    hasher.update(&point_to_bytes(&shared));
    hasher.update(&point_to_bytes(trustee));
    let mut key = *hasher.finalize().as_bytes();
    let cipher = ChaCha20Poly1305::new_from_slice(&key).map_err(|_| RelayError::Seal);
    key.zeroize();
    cipher
}

#[cfg(test)]
mod tests {
    use super::*;
    use ots_threshold::dleq::DleqProof;
    use ots_threshold::generator;

    fn share() -> PubVerShare {
        let mut rng = rand::thread_rng();
        let g = generator();
        let (proof, value, _) = DleqProof::create(&g, &g, &Fr::from(5u64), &mut rng);
        PubVerShare {
            index: 3,
            value,
            proof,
        }
    }

    #[test]
    fn test_only_the_reader_can_open() {
        let trustee = KeyPair::random();
        let reader = KeyPair::random();
        let other = KeyPair::random();
        let original = share();

        let sealed = reencrypt(&original, &reader.public(), &trustee).unwrap();
        assert_eq!(open(&sealed, &trustee.public(), &reader).unwrap(), original);
        assert_eq!(
            open(&sealed, &trustee.public(), &other),
            Err(RelayError::Open)
        );
    }

    #[test]
    fn test_wrong_trustee_key_fails() {
        let trustee = KeyPair::random();
        let reader = KeyPair::random();
        let sealed = reencrypt(&share(), &reader.public(), &trustee).unwrap();
        assert_eq!(
            open(&sealed, &KeyPair::random().public(), &reader),
            Err(RelayError::Open)
        );
    }

    #[test]
    fn test_empty_and_short_ciphertexts() {
        let reader = KeyPair::random();
        let trustee = KeyPair::random().public();
        assert_eq!(open(&[], &trustee, &reader), Err(RelayError::Truncated));
        assert_eq!(open(&[0u8; 12], &trustee, &reader), Err(RelayError::Truncated));
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let trustee = KeyPair::random();
        let reader = KeyPair::random();
        let s = share();
        let a = reencrypt(&s, &reader.public(), &trustee).unwrap();
        let b = reencrypt(&s, &reader.public(), &trustee).unwrap();
        assert_ne!(a, b);
    }
}
