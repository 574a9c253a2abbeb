//! Canonical byte and hex encodings for arkworks types.
//!
//! Points and scalars are written in arkworks' compressed canonical form.
//! The `hex_*` modules plug into `#[serde(with = "...")]`.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Deserializer, Serializer};

use crate::errors::{Result, ThresholdError};
use crate::{Fr, G1Affine};

/// Compressed size of a G1 point
pub const POINT_SIZE: usize = 32;
/// Compressed size of a scalar
pub const SCALAR_SIZE: usize = 32;

pub fn point_to_bytes(point: &G1Affine) -> Vec<u8> {
    let mut buf = Vec::with_capacity(POINT_SIZE);
    point
        .serialize_compressed(&mut buf)
        .expect("writing into a Vec cannot fail");
    buf
}

pub fn point_from_bytes(bytes: &[u8]) -> Result<G1Affine> {
    G1Affine::deserialize_compressed(bytes)
        .map_err(|e| ThresholdError::Encoding(format!("G1 point: {e}")))
}

pub fn scalar_to_bytes(scalar: &Fr) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SCALAR_SIZE);
    scalar
        .serialize_compressed(&mut buf)
        .expect("writing into a Vec cannot fail");
    buf
}

pub fn scalar_from_bytes(bytes: &[u8]) -> Result<Fr> {
    Fr::deserialize_compressed(bytes).map_err(|e| ThresholdError::Encoding(format!("scalar: {e}")))
}

/// Parse a hex string into a point (accepts an optional `0x` prefix)
pub fn point_from_hex(s: &str) -> Result<G1Affine> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| ThresholdError::Encoding(format!("hex: {e}")))?;
    point_from_bytes(&bytes)
}

pub fn point_to_hex(point: &G1Affine) -> String {
    hex::encode(point_to_bytes(point))
}

pub fn scalar_from_hex(s: &str) -> Result<Fr> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| ThresholdError::Encoding(format!("hex: {e}")))?;
    scalar_from_bytes(&bytes)
}

pub fn scalar_to_hex(scalar: &Fr) -> String {
    hex::encode(scalar_to_bytes(scalar))
}

pub mod hex_point {
    use super::*;

    pub fn serialize<S: Serializer>(point: &G1Affine, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&point_to_hex(point))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<G1Affine, D::Error> {
        let s = String::deserialize(deserializer)?;
        point_from_hex(&s).map_err(serde::de::Error::custom)
    }
}

pub mod hex_points {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(points: &[G1Affine], serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(points.len()))?;
        for point in points {
            seq.serialize_element(&point_to_hex(point))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<G1Affine>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| point_from_hex(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

pub mod hex_scalar {
    use super::*;

    pub fn serialize<S: Serializer>(scalar: &Fr, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&scalar_to_hex(scalar))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Fr, D::Error> {
        let s = String::deserialize(deserializer)?;
        scalar_from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::{AffineRepr, CurveGroup};

    #[test]
    fn test_point_hex_accepts_prefix() {
        let point = (G1Affine::generator() * Fr::from(42u64)).into_affine();
        let hex = point_to_hex(&point);
        assert_eq!(hex.len(), POINT_SIZE * 2);
        assert_eq!(point_from_hex(&format!("0x{hex}")).unwrap(), point);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(point_from_hex("zz").is_err());
        assert!(point_from_bytes(&[0xffu8; 7]).is_err());
        assert!(scalar_from_bytes(&[]).is_err());
    }
}
