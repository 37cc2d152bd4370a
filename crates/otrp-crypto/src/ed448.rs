//! Ed448 keypair, point and scalar primitives.
//!
//! This module is a thin adapter over `ed448-goldilocks`'s curve
//! arithmetic: the rest of the workspace never touches `EdwardsPoint` or
//! the curve's native `Scalar` type directly, only the fixed-width
//! `Point`/`Scalar` newtypes defined here, which are exactly the 57-byte
//! compressed point and 56-byte little-endian scalar the wire codec
//! expects.

use ed448_goldilocks::{CompressedEdwardsY, EdwardsPoint, Scalar as CurveScalar};
use ed448_goldilocks::sign::{Signature, SigningKey, VerifyingKey};
use subtle::ConstantTimeEq;

use crate::error::CryptoError;
use crate::rand::WithRandom;

pub const SCALAR_LEN: usize = 56;
pub const POINT_LEN: usize = 57;

/// A 56-byte little-endian Ed448 scalar, reduced modulo the group order.
#[derive(Clone, Copy)]
pub struct Scalar(pub(crate) CurveScalar);

impl Scalar {
    pub fn from_bytes(bytes: &[u8; SCALAR_LEN]) -> Result<Self, CryptoError> {
        CurveScalar::from_canonical_bytes((*bytes).into())
            .into_option()
            .map(Scalar)
            .ok_or(CryptoError::InvalidScalar)
    }

    pub fn to_bytes(self) -> [u8; SCALAR_LEN] {
        self.0.to_bytes()
    }

    pub fn random(source: &dyn WithRandom) -> Result<Self, CryptoError> {
        let mut wide = [0u8; SCALAR_LEN * 2];
        crate::rand::random_into(source, &mut wide)?;
        Ok(Scalar(CurveScalar::from_bytes_mod_order_wide(&wide.into())))
    }

    pub fn zero() -> Self {
        Scalar(CurveScalar::ZERO)
    }

    /// Reduces an arbitrary-length digest (e.g. a KDF challenge output)
    /// into a scalar mod the group order, padding or truncating to the
    /// curve's wide-scalar width as needed.
    pub fn from_wide_digest(digest: &[u8]) -> Self {
        let mut wide = [0u8; SCALAR_LEN * 2];
        let n = digest.len().min(wide.len());
        wide[..n].copy_from_slice(&digest[..n]);
        Scalar(CurveScalar::from_bytes_mod_order_wide(&wide.into()))
    }

    pub fn add(self, other: Self) -> Self {
        Scalar(self.0 + other.0)
    }

    pub fn sub(self, other: Self) -> Self {
        Scalar(self.0 - other.0)
    }

    pub fn mul(self, other: Self) -> Self {
        Scalar(self.0 * other.0)
    }

    pub fn ct_eq(&self, other: &Self) -> bool {
        bool::from(self.to_bytes().as_slice().ct_eq(other.to_bytes().as_slice()))
    }
}

/// Sum of a slice of scalars, used by the proof engine to fold a ring of
/// private values into one response term.
pub fn sum_scalars(values: &[Scalar]) -> Scalar {
    values.iter().fold(Scalar::zero(), |acc, v| acc.add(*v))
}

/// A 57-byte compressed Ed448 point.
#[derive(Clone, Copy)]
pub struct Point(pub(crate) CompressedEdwardsY);

impl Point {
    pub fn from_bytes(bytes: &[u8; POINT_LEN]) -> Result<Self, CryptoError> {
        let c = CompressedEdwardsY(*bytes);
        c.decompress()
            .into_option()
            .ok_or(CryptoError::InvalidPoint)?;
        Ok(Point(c))
    }

    pub fn to_bytes(self) -> [u8; POINT_LEN] {
        self.0 .0
    }

    fn to_extended(self) -> EdwardsPoint {
        self.0.decompress().into_option().expect("validated on construction")
    }

    pub fn generator_times(scalar: Scalar) -> Self {
        Point((EdwardsPoint::GENERATOR * scalar.0).compress())
    }

    pub fn add(self, other: Self) -> Self {
        Point((self.to_extended() + other.to_extended()).compress())
    }

    pub fn scalar_mul(self, scalar: Scalar) -> Self {
        Point((self.to_extended() * scalar.0).compress())
    }
}

/// An Ed448 signing keypair: a private scalar and its public point.
pub struct KeyPair {
    signing: SigningKey,
    pub public: Point,
}

impl KeyPair {
    pub fn generate(source: &dyn WithRandom) -> Result<Self, CryptoError> {
        let private = Scalar::random(source)?;
        Self::from_scalar(private)
    }

    pub fn from_scalar(private: Scalar) -> Result<Self, CryptoError> {
        let signing = SigningKey::from_bytes(&private.to_bytes());
        let public = Point(signing.verifying_key().to_bytes().into());
        Ok(KeyPair { signing, public })
    }

    pub fn private_scalar(&self) -> Scalar {
        Scalar(self.signing.to_scalar())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 114] {
        self.signing.sign(message).to_bytes()
    }
}

pub fn verify(public: Point, message: &[u8], signature: &[u8; 114]) -> Result<(), CryptoError> {
    let verifying = VerifyingKey::from_bytes(&public.to_bytes()).map_err(|_| CryptoError::InvalidPoint)?;
    let sig = Signature::from_bytes(signature);
    verifying
        .verify_strict(message, &sig)
        .map_err(|_| CryptoError::SignatureInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rand::SystemRandom;

    #[test]
    fn sign_and_verify_roundtrip() {
        let kp = KeyPair::generate(&SystemRandom).unwrap();
        let sig = kp.sign(b"hello prekey server");
        assert!(verify(kp.public, b"hello prekey server", &sig).is_ok());
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let kp = KeyPair::generate(&SystemRandom).unwrap();
        let sig = kp.sign(b"hello prekey server");
        assert!(verify(kp.public, b"goodbye prekey server", &sig).is_err());
    }

    #[test]
    fn scalar_arithmetic_is_consistent() {
        let a = Scalar::random(&SystemRandom).unwrap();
        let b = Scalar::random(&SystemRandom).unwrap();
        let sum = a.add(b);
        let back = sum.sub(b);
        assert!(back.ct_eq(&a));
    }
}
