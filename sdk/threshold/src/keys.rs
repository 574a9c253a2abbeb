//! Trustee, reader and committee key pairs.

use std::fmt;

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::UniformRand;
use ark_std::rand::Rng;

use crate::serde_utils::point_to_hex;
use crate::{Fr, G1Affine};

/// A scalar private key and its public point `G * secret`
#[derive(Clone)]
pub struct KeyPair {
    secret: Fr,
    public: G1Affine,
}

impl KeyPair {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_secret(Fr::rand(rng))
    }

    /// Generate from the thread-local RNG
    pub fn random() -> Self {
        Self::generate(&mut rand::thread_rng())
    }

    pub fn from_secret(secret: Fr) -> Self {
        let public = (G1Affine::generator() * secret).into_affine();
        Self { secret, public }
    }

    pub fn secret(&self) -> &Fr {
        &self.secret
    }

    pub fn public(&self) -> G1Affine {
        self.public
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &point_to_hex(&self.public))
            .finish_non_exhaustive()
    }
}
