//! Publicly verifiable secret sharing
//!
//! A dealer splits a secret scalar `s` with a degree `t - 1` polynomial `f`
//! and publishes, for every trustee `i` with public key `X_i`:
//!
//! - the encrypted share `S_i = X_i * f(i+1)` with a DLEQ proof that
//!   `log_H(H_i) == log_{X_i}(S_i)`,
//! - the commitment `H_i = H * f(i+1)` (the "proof" vector).
//!
//! Trustee `i` decrypts its share to `D_i = G * f(i+1)` with a DLEQ proof
//! that `log_G(X_i) == log_{D_i}(S_i)`. Any `t` valid decrypted shares give
//! `G * s` by Lagrange interpolation in the exponent.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, UniformRand};
use ark_std::Zero;
use ark_std::rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dleq::DleqProof;
use crate::errors::{Result, ThresholdError};
use crate::serde_utils::hex_point;
use crate::shares::{Polynomial, lagrange_coefficient, x_coordinate};
use crate::{Fr, G1Affine, G1Projective};

/// A share together with the proof that it is well formed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubVerShare {
    /// 0-indexed trustee slot
    pub index: u32,
    #[serde(with = "hex_point")]
    pub value: G1Affine,
    pub proof: DleqProof,
}

/// Split `secret` into one encrypted share per public key.
///
/// Returns the encrypted shares and the commitments `H * f(i+1)`, both
/// index-aligned with `pub_keys`.
pub fn enc_shares<R: Rng + ?Sized>(
    h: &G1Affine,
    pub_keys: &[G1Affine],
    secret: &Fr,
    t: usize,
    rng: &mut R,
) -> Result<(Vec<PubVerShare>, Vec<G1Affine>)> {
    let n = pub_keys.len();
    if t == 0 || t > n {
        return Err(ThresholdError::InvalidThreshold { t, n });
    }

    let poly = Polynomial::random(*secret, t, rng)?;
    let mut shares = Vec::with_capacity(n);
    let mut commitments = Vec::with_capacity(n);

    for (i, x_i) in pub_keys.iter().enumerate() {
        let index = i as u32;
        let s_i = poly.share(index);
        let (proof, h_i, enc) = DleqProof::create(h, x_i, &s_i, rng);
        shares.push(PubVerShare {
            index,
            value: enc,
            proof,
        });
        commitments.push(h_i);
    }

    Ok((shares, commitments))
}

/// Check an encrypted share against its trustee key and commitment
pub fn verify_enc_share(
    h: &G1Affine,
    pub_key: &G1Affine,
    commitment: &G1Affine,
    share: &PubVerShare,
) -> Result<()> {
    share
        .proof
        .verify(h, pub_key, commitment, &share.value)
        .map_err(|_| ThresholdError::BadEncShare { index: share.index })
}

/// Verify every encrypted share and return the indices that passed
pub fn verify_enc_share_batch(
    h: &G1Affine,
    pub_keys: &[G1Affine],
    commitments: &[G1Affine],
    shares: &[PubVerShare],
) -> Result<Vec<u32>> {
    check_len("commitments", commitments.len(), pub_keys.len())?;
    check_len("encrypted shares", shares.len(), pub_keys.len())?;

    Ok(pub_keys
        .iter()
        .zip(commitments)
        .zip(shares)
        .enumerate()
        .filter(|(i, ((x, c), s))| s.index as usize == *i && verify_enc_share(h, x, c, s).is_ok())
        .map(|(i, _)| i as u32)
        .collect())
}

/// Decrypt one encrypted share with the trustee's private key.
///
/// The encrypted share is verified first; a share that does not match its
/// commitment is never decrypted.
pub fn dec_share<R: Rng + ?Sized>(
    h: &G1Affine,
    pub_key: &G1Affine,
    commitment: &G1Affine,
    secret_key: &Fr,
    enc_share: &PubVerShare,
    rng: &mut R,
) -> Result<PubVerShare> {
    verify_enc_share(h, pub_key, commitment, enc_share)?;

    let inverse = secret_key.inverse().ok_or(ThresholdError::ZeroKey)?;
    let value = (enc_share.value * inverse).into_affine();

    let g = G1Affine::generator();
    let (proof, _, _) = DleqProof::create(&g, &value, secret_key, rng);

    Ok(PubVerShare {
        index: enc_share.index,
        value,
        proof,
    })
}

/// Check that a decrypted share is the correct decryption of `enc_share`
pub fn verify_dec_share(
    g: &G1Affine,
    pub_key: &G1Affine,
    enc_share: &PubVerShare,
    dec_share: &PubVerShare,
) -> Result<()> {
    if dec_share.index != enc_share.index {
        return Err(ThresholdError::BadDecShare {
            index: dec_share.index,
        });
    }
    dec_share
        .proof
        .verify(g, &dec_share.value, pub_key, &enc_share.value)
        .map_err(|_| ThresholdError::BadDecShare {
            index: dec_share.index,
        })
}

/// Verify the decrypted shares that are present and return the indices that passed
pub fn verify_dec_share_batch(
    g: &G1Affine,
    pub_keys: &[G1Affine],
    enc_shares: &[PubVerShare],
    dec_shares: &[Option<PubVerShare>],
) -> Result<Vec<u32>> {
    check_len("encrypted shares", enc_shares.len(), pub_keys.len())?;
    check_len("decrypted shares", dec_shares.len(), pub_keys.len())?;

    Ok(pub_keys
        .iter()
        .zip(enc_shares)
        .zip(dec_shares)
        .filter_map(|((x, enc), dec)| {
            let dec = dec.as_ref()?;
            verify_dec_share(g, x, enc, dec).ok().map(|_| dec.index)
        })
        .collect())
}

/// Recover `G * secret` from at least `t` valid decrypted shares.
///
/// `dec_shares` is index-aligned with `pub_keys`; missing or invalid entries
/// are skipped. Only the first `t` valid shares are interpolated.
pub fn recover_secret(
    g: &G1Affine,
    pub_keys: &[G1Affine],
    enc_shares: &[PubVerShare],
    dec_shares: &[Option<PubVerShare>],
    t: usize,
    n: usize,
) -> Result<G1Affine> {
    if t == 0 || t > n {
        return Err(ThresholdError::InvalidThreshold { t, n });
    }
    check_len("public keys", pub_keys.len(), n)?;

    let valid = verify_dec_share_batch(g, pub_keys, enc_shares, dec_shares)?;
    if valid.len() < t {
        return Err(ThresholdError::InsufficientShares {
            got: valid.len(),
            need: t,
        });
    }

    let chosen = &valid[..t];
    let xs: Vec<Fr> = chosen.iter().map(|&i| x_coordinate(i)).collect();

    let mut acc = G1Projective::zero();
    for (k, &i) in chosen.iter().enumerate() {
        let lambda = lagrange_coefficient(&xs, k)?;
        if let Some(share) = &dec_shares[i as usize] {
            acc += share.value * lambda;
        }
    }
    Ok(acc.into_affine())
}

/// Fresh random secret scalar for a dealer
pub fn random_secret<R: Rng + ?Sized>(rng: &mut R) -> Fr {
    Fr::rand(rng)
}

fn check_len(what: &'static str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(ThresholdError::LengthMismatch {
            what,
            got,
            expected,
        });
    }
    Ok(())
}
