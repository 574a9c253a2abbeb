//! Schnorr signatures on G1
//!
//! Signature `(R, s)` with `R = G*k`, `c = H(R, X, msg)`, `s = k + c*x`.
//! Verification checks `G*s == R + X*c`.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::UniformRand;
use ark_std::rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ThresholdError};
use crate::hash::challenge;
use crate::keys::KeyPair;
use crate::serde_utils::{hex_point, hex_scalar, point_to_bytes, scalar_to_bytes};
use crate::{Fr, G1Affine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "hex_point")]
    pub commitment: G1Affine,
    #[serde(with = "hex_scalar")]
    pub response: Fr,
}

impl Signature {
    /// Canonical 64-byte encoding: compressed `R` then `s`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = point_to_bytes(&self.commitment);
        out.extend_from_slice(&scalar_to_bytes(&self.response));
        out
    }
}

pub fn sign_with<R: Rng + ?Sized>(keypair: &KeyPair, message: &[u8], rng: &mut R) -> Signature {
    let nonce = Fr::rand(rng);
    let commitment = (G1Affine::generator() * nonce).into_affine();
    let public = keypair.public();
    let c = challenge(&[&commitment, &public], message);
    Signature {
        commitment,
        response: nonce + c * keypair.secret(),
    }
}

pub fn sign(keypair: &KeyPair, message: &[u8]) -> Signature {
    sign_with(keypair, message, &mut rand::thread_rng())
}

pub fn verify(public: &G1Affine, message: &[u8], signature: &Signature) -> Result<()> {
    let c = challenge(&[&signature.commitment, public], message);
    let lhs = G1Affine::generator() * signature.response;
    let rhs = *public * c + signature.commitment;
    if lhs != rhs {
        return Err(ThresholdError::BadSignature);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::test_rng;

    #[test]
    fn test_sign_verify() {
        let mut rng = test_rng();
        let kp = KeyPair::generate(&mut rng);
        let sig = sign_with(&kp, b"hello", &mut rng);
        assert!(verify(&kp.public(), b"hello", &sig).is_ok());
        assert_eq!(sig.to_bytes().len(), 64);
    }

    #[test]
    fn test_wrong_message_or_key_rejected() {
        let mut rng = test_rng();
        let kp = KeyPair::generate(&mut rng);
        let other = KeyPair::generate(&mut rng);
        let sig = sign_with(&kp, b"hello", &mut rng);

        assert_eq!(
            verify(&kp.public(), b"hellO", &sig),
            Err(ThresholdError::BadSignature)
        );
        assert_eq!(
            verify(&other.public(), b"hello", &sig),
            Err(ThresholdError::BadSignature)
        );
    }
}
