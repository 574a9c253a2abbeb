//! Shamir polynomial over the BN254 scalar field
//!
//! Share `i` (0-indexed) is the evaluation at `x = i + 1`, so no share ever
//! sits at the secret's evaluation point `x = 0`.

use ark_ff::{Field, UniformRand};
use ark_std::rand::Rng;
use ark_std::{One, Zero};

use crate::Fr;
use crate::errors::{Result, ThresholdError};

/// A random polynomial of degree `t - 1` whose constant term is the secret
#[derive(Clone)]
pub struct Polynomial {
    coefficients: Vec<Fr>,
}

impl Polynomial {
    /// Sample `f(x) = secret + a_1*x + ... + a_{t-1}*x^{t-1}`
    pub fn random<R: Rng + ?Sized>(secret: Fr, t: usize, rng: &mut R) -> Result<Self> {
        if t == 0 {
            return Err(ThresholdError::InvalidThreshold { t, n: 0 });
        }
        let mut coefficients = Vec::with_capacity(t);
        coefficients.push(secret);
        for _ in 1..t {
            coefficients.push(Fr::rand(rng));
        }
        Ok(Self { coefficients })
    }

    pub fn threshold(&self) -> usize {
        self.coefficients.len()
    }

    /// Evaluate with Horner's method
    pub fn evaluate(&self, x: Fr) -> Fr {
        self.coefficients
            .iter()
            .rev()
            .fold(Fr::zero(), |acc, coeff| acc * x + coeff)
    }

    /// Value of share `index`, i.e. `f(index + 1)`
    pub fn share(&self, index: u32) -> Fr {
        self.evaluate(x_coordinate(index))
    }
}

/// Evaluation point of the 0-indexed share `index`
pub fn x_coordinate(index: u32) -> Fr {
    Fr::from(index as u64 + 1)
}

/// Lagrange coefficient λ_i(0) for interpolating at x = 0
///
/// λ_i(0) = Π_{j≠i} x_j / (x_j - x_i)
pub fn lagrange_coefficient(x_coords: &[Fr], i: usize) -> Result<Fr> {
    let mut numerator = Fr::one();
    let mut denominator = Fr::one();

    for (j, &x_j) in x_coords.iter().enumerate() {
        if i != j {
            numerator *= x_j;
            denominator *= x_j - x_coords[i];
        }
    }

    let inverse = denominator
        .inverse()
        .ok_or(ThresholdError::DuplicateIndex(i as u32))?;
    Ok(numerator * inverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::test_rng;

    fn interpolate(points: &[(u32, Fr)]) -> Fr {
        let xs: Vec<Fr> = points.iter().map(|(i, _)| x_coordinate(*i)).collect();
        points
            .iter()
            .enumerate()
            .map(|(k, (_, y))| *y * lagrange_coefficient(&xs, k).unwrap())
            .fold(Fr::zero(), |acc, term| acc + term)
    }

    #[test]
    fn test_any_t_shares_interpolate_the_secret() {
        let mut rng = test_rng();
        let secret = Fr::rand(&mut rng);
        let poly = Polynomial::random(secret, 4, &mut rng).unwrap();
        assert_eq!(poly.evaluate(Fr::zero()), secret);

        for subset in [[0u32, 1, 2, 3], [1, 3, 4, 6], [0, 2, 4, 6]] {
            let points: Vec<(u32, Fr)> = subset.iter().map(|&i| (i, poly.share(i))).collect();
            assert_eq!(interpolate(&points), secret);
        }
    }

    #[test]
    fn test_fewer_than_t_shares_miss_the_secret() {
        let mut rng = test_rng();
        let secret = Fr::rand(&mut rng);
        let poly = Polynomial::random(secret, 4, &mut rng).unwrap();
        let points: Vec<(u32, Fr)> = (0..3).map(|i| (i, poly.share(i))).collect();
        assert_ne!(interpolate(&points), secret);
    }

    #[test]
    fn test_duplicate_x_is_an_error() {
        let xs = vec![x_coordinate(2), x_coordinate(2)];
        assert_eq!(
            lagrange_coefficient(&xs, 0),
            Err(ThresholdError::DuplicateIndex(0))
        );
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let mut rng = test_rng();
        assert!(Polynomial::random(Fr::one(), 0, &mut rng).is_err());
    }
}
