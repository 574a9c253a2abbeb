//! Hashing into the group and into the scalar field.

use ark_ff::PrimeField;
use sha2::{Digest, Sha256};

use crate::serde_utils::point_to_bytes;
use crate::{Fq, Fr, G1Affine};

const HASH_TO_POINT_DOMAIN: &[u8] = b"ots-hash-to-point-v1";

/// Deterministically map `seed` to a point of G1 with unknown discrete log.
///
/// Try-and-increment: hash `seed || counter` to a base-field element and keep
/// the first one that is the x-coordinate of a curve point. BN254 G1 has
/// cofactor 1, so every curve point lies in the prime-order group.
pub fn hash_to_point(seed: &[u8]) -> G1Affine {
    let mut counter: u32 = 0;
    loop {
        let mut hasher = Sha256::new();
        hasher.update(HASH_TO_POINT_DOMAIN);
        hasher.update(seed);
        hasher.update(counter.to_be_bytes());
        let x = Fq::from_be_bytes_mod_order(&hasher.finalize());
        if let Some(point) = G1Affine::get_point_from_x_unchecked(x, false) {
            return point;
        }
        counter = counter.wrapping_add(1);
    }
}

/// The second generator `H` bound to a reader's public key
pub fn point_for_key(public: &G1Affine) -> G1Affine {
    hash_to_point(&point_to_bytes(public))
}

/// Fiat-Shamir challenge over a list of points and trailing message bytes
pub fn challenge(points: &[&G1Affine], message: &[u8]) -> Fr {
    let mut hasher = Sha256::new();
    for point in points {
        hasher.update(point_to_bytes(point));
    }
    hasher.update(message);
    Fr::from_le_bytes_mod_order(&hasher.finalize())
}
