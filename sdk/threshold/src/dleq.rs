//! Chaum-Pedersen proof of discrete-log equality.
//!
//! Proves knowledge of `x` with `xG = G*x` and `xH = H*x` for two bases
//! without revealing `x`.

use ark_ec::CurveGroup;
use ark_ff::UniformRand;
use ark_std::rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ThresholdError};
use crate::hash::challenge;
use crate::serde_utils::{hex_point, hex_scalar};
use crate::{Fr, G1Affine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DleqProof {
    /// Fiat-Shamir challenge
    #[serde(with = "hex_scalar")]
    pub challenge: Fr,
    /// Response: nonce + challenge * x
    #[serde(with = "hex_scalar")]
    pub response: Fr,
    /// Commitment on the first base: G * nonce
    #[serde(with = "hex_point")]
    pub commit_g: G1Affine,
    /// Commitment on the second base: H * nonce
    #[serde(with = "hex_point")]
    pub commit_h: G1Affine,
}

impl DleqProof {
    /// Prove `log_g(xg) == log_h(xh) == x`, returning the proof with `xg` and `xh`
    pub fn create<R: Rng + ?Sized>(
        g: &G1Affine,
        h: &G1Affine,
        x: &Fr,
        rng: &mut R,
    ) -> (Self, G1Affine, G1Affine) {
        let xg = (*g * x).into_affine();
        let xh = (*h * x).into_affine();

        let nonce = Fr::rand(rng);
        let commit_g = (*g * nonce).into_affine();
        let commit_h = (*h * nonce).into_affine();

        let challenge = challenge(&[g, h, &xg, &xh, &commit_g, &commit_h], b"dleq");
        let response = nonce + challenge * x;

        (
            Self {
                challenge,
                response,
                commit_g,
                commit_h,
            },
            xg,
            xh,
        )
    }

    /// Check `G*r == commit_g + xG*c` and `H*r == commit_h + xH*c`
    pub fn verify(&self, g: &G1Affine, h: &G1Affine, xg: &G1Affine, xh: &G1Affine) -> Result<()> {
        let expected = challenge(&[g, h, xg, xh, &self.commit_g, &self.commit_h], b"dleq");
        if expected != self.challenge {
            return Err(ThresholdError::BadProof);
        }

        let lhs_g = *g * self.response;
        let rhs_g = *xg * self.challenge + self.commit_g;
        let lhs_h = *h * self.response;
        let rhs_h = *xh * self.challenge + self.commit_h;

        if lhs_g != rhs_g || lhs_h != rhs_h {
            return Err(ThresholdError::BadProof);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_to_point;
    use ark_ec::AffineRepr;
    use ark_std::test_rng;

    #[test]
    fn test_honest_proof_verifies() {
        let mut rng = test_rng();
        let g = G1Affine::generator();
        let h = hash_to_point(b"second base");
        let x = Fr::rand(&mut rng);

        let (proof, xg, xh) = DleqProof::create(&g, &h, &x, &mut rng);
        assert!(proof.verify(&g, &h, &xg, &xh).is_ok());
    }

    #[test]
    fn test_unequal_logs_rejected() {
        let mut rng = test_rng();
        let g = G1Affine::generator();
        let h = hash_to_point(b"second base");
        let x = Fr::rand(&mut rng);

        let (proof, xg, _) = DleqProof::create(&g, &h, &x, &mut rng);
        let wrong_xh = (h * (x + Fr::from(1u64))).into_affine();
        assert_eq!(
            proof.verify(&g, &h, &xg, &wrong_xh),
            Err(ThresholdError::BadProof)
        );
    }

    #[test]
    fn test_tampered_response_rejected() {
        let mut rng = test_rng();
        let g = G1Affine::generator();
        let h = hash_to_point(b"second base");
        let x = Fr::rand(&mut rng);

        let (mut proof, xg, xh) = DleqProof::create(&g, &h, &x, &mut rng);
        proof.response += Fr::from(1u64);
        assert!(proof.verify(&g, &h, &xg, &xh).is_err());
    }
}
