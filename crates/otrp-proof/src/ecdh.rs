//! Ring-style equality-of-discrete-log proof over Ed448.
//!
//! Proves knowledge of private scalars `a_0 … a_{n-1}` for public points
//! `A_0 … A_{n-1}` (with `A_i = a_i · G`) without revealing which `a_i`
//! belongs to which statement individually — the proof is over the sum.

use otrp_crypto::ed448::{sum_scalars, Point, Scalar};
use otrp_crypto::kdf::{kdf64, Usage};
use otrp_crypto::rand::WithRandom;
use otrp_wire::{Decoder, Encoder};
use subtle::ConstantTimeEq;

use crate::error::ProofError;

/// Proof lists longer than this are rejected outright; chosen generously
/// above any realistic publication batch size.
pub const MAX_PROOF_VALUES: usize = 32;

pub struct EcdhProof {
    pub c: [u8; 64],
    pub v: Scalar,
}

impl EcdhProof {
    pub fn serialize(&self) -> Vec<u8> {
        let mut e = Encoder::new();
        e.write_data(&self.c);
        e.write_scalar(&self.v.to_bytes());
        e.into_bytes()
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, otrp_wire::WireError> {
        let mut d = Decoder::new(bytes);
        let c_vec = d.read_data()?;
        let mut c = [0u8; 64];
        c.copy_from_slice(&c_vec);
        let v_bytes = d.read_scalar()?;
        let v = Scalar::from_bytes(&v_bytes).map_err(|_| otrp_wire::WireError::MalformedInput)?;
        Ok(EcdhProof { c, v })
    }
}

fn challenge(usage: Usage, public_values: &[Point], t: Point, message: &[u8]) -> [u8; 64] {
    let mut e = Encoder::new();
    for a in public_values {
        e.write_point(&a.to_bytes());
    }
    e.write_point(&t.to_bytes());
    e.into_bytes();
    let mut data = e.into_bytes();
    data.extend_from_slice(message);
    kdf64(usage, b"", &data)
}

/// Generates a proof of knowledge of `keypairs`' private scalars relative
/// to their public points, bound to `message` under `usage`.
pub fn generate(
    source: &dyn WithRandom,
    keypairs: &[(Scalar, Point)],
    message: &[u8],
    usage: Usage,
) -> Result<EcdhProof, ProofError> {
    if keypairs.is_empty() || keypairs.len() > MAX_PROOF_VALUES {
        return Err(ProofError::EmptyValueList);
    }
    let publics: Vec<Point> = keypairs.iter().map(|(_, a)| *a).collect();
    let privates: Vec<Scalar> = keypairs.iter().map(|(a, _)| *a).collect();

    let t = Scalar::random(source)?;
    let t_point = Point::generator_times(t);
    let c = challenge(usage, &publics, t_point, message);
    let c_scalar = Scalar::from_wide_digest(&c);
    let v = t.sub(c_scalar.mul(sum_scalars(&privates)));
    Ok(EcdhProof { c, v })
}

/// Verifies a proof against the given public points. Constant-time in
/// the challenge comparison.
pub fn verify(proof: &EcdhProof, public_values: &[Point], message: &[u8], usage: Usage) -> bool {
    if public_values.is_empty() || public_values.len() > MAX_PROOF_VALUES {
        return false;
    }
    let c_scalar = Scalar::from_wide_digest(&proof.c);
    let sum_a = public_values
        .iter()
        .skip(1)
        .fold(public_values[0], |acc, p| acc.add(*p));
    let t_prime = Point::generator_times(proof.v).add(sum_a.scalar_mul(c_scalar));
    let c_prime = challenge(usage, public_values, t_prime, message);
    bool::from(proof.c.as_slice().ct_eq(c_prime.as_slice()))
}
