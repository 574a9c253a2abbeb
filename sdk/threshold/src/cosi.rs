//! Collective signatures for a fixed committee
//!
//! Every member contributes a nonce commitment and a response; the result is
//! an ordinary Schnorr signature under the aggregate key `Σ X_i`.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::UniformRand;
use ark_std::Zero;
use ark_std::rand::Rng;

use crate::errors::{Result, ThresholdError};
use crate::hash::challenge;
use crate::keys::KeyPair;
use crate::schnorr::{self, Signature};
use crate::{Fr, G1Affine, G1Projective};

/// Collective signature of the whole committee
pub type CollectiveSignature = Signature;

/// Sum of the committee's public keys
pub fn aggregate_key(publics: &[G1Affine]) -> Result<G1Affine> {
    if publics.is_empty() {
        return Err(ThresholdError::EmptySignerSet);
    }
    Ok(publics
        .iter()
        .fold(G1Projective::zero(), |acc, p| acc + p)
        .into_affine())
}

/// Co-sign `message` with every member of the committee
pub fn sign_with<R: Rng + ?Sized>(
    members: &[KeyPair],
    message: &[u8],
    rng: &mut R,
) -> Result<CollectiveSignature> {
    let publics: Vec<G1Affine> = members.iter().map(KeyPair::public).collect();
    let aggregate = aggregate_key(&publics)?;

    // Commitment phase
    let nonces: Vec<Fr> = members.iter().map(|_| Fr::rand(rng)).collect();
    let commitment = nonces
        .iter()
        .fold(G1Projective::zero(), |acc, k| acc + G1Affine::generator() * k)
        .into_affine();

    // Response phase
    let c = challenge(&[&commitment, &aggregate], message);
    let response = members
        .iter()
        .zip(&nonces)
        .fold(Fr::zero(), |acc, (member, k)| acc + k + c * member.secret());

    Ok(Signature {
        commitment,
        response,
    })
}

pub fn sign(members: &[KeyPair], message: &[u8]) -> Result<CollectiveSignature> {
    sign_with(members, message, &mut rand::thread_rng())
}

/// Verify a collective signature against the full committee
pub fn verify(publics: &[G1Affine], message: &[u8], signature: &CollectiveSignature) -> Result<()> {
    let aggregate = aggregate_key(publics)?;
    schnorr::verify(&aggregate, message, signature)
}
