//! OTS Threshold Primitives
//!
//! Publicly verifiable secret sharing (PVSS) and the signature schemes the
//! ledger and the decryption protocol rely on, all over BN254 G1.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Writer                 Trustee i                  Reader         │
//! │  ┌──────────────┐      ┌──────────────────┐      ┌─────────────┐ │
//! │  │ enc_shares   │─S_i─▶│ dec_share (x_i)  │─D_i─▶│ recover     │ │
//! │  │ (t-of-n, H)  │      │ + DLEQ proof     │      │ G*s from ≥t │ │
//! │  └──────────────┘      └──────────────────┘      └─────────────┘ │
//! │                                                                  │
//! │  Anyone can check S_i (verify_enc_share) and D_i (verify_dec_    │
//! │  share) without learning the secret.                             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod cosi;
pub mod dleq;
pub mod errors;
pub mod hash;
pub mod keys;
pub mod pvss;
pub mod schnorr;
pub mod serde_utils;
pub mod shares;

pub use ark_bn254::{Fq, Fr, G1Affine, G1Projective};

pub use cosi::CollectiveSignature;
pub use dleq::DleqProof;
pub use errors::{Result, ThresholdError};
pub use hash::{hash_to_point, point_for_key};
pub use keys::KeyPair;
pub use pvss::{
    PubVerShare, dec_share, enc_shares, recover_secret, verify_dec_share, verify_dec_share_batch,
    verify_enc_share, verify_enc_share_batch,
};
pub use schnorr::Signature;

/// The fixed base point `G` of G1
pub fn generator() -> G1Affine {
    <G1Affine as ark_ec::AffineRepr>::generator()
}
