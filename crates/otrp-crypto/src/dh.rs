//! The 3072-bit Diffie–Hellman group (RFC 3526 group 16, generator `g = 2`)
//! used alongside Ed448 in the publication proofs.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use once_cell::sync::Lazy;

use crate::error::CryptoError;
use crate::rand::WithRandom;

/// RFC 3526 group 16's 3072-bit prime, `p`.
const MODULUS_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E0",
    "88A67CC74020BBEA63B139B22514A08798E3404DDEF9519B3CD3A43",
    "1B302B0A6DF25F14374FE1356D6D51C245E485B576625E7EC6F44C4",
    "2E9A637ED6B0BFF5CB6F406B7EDEE386BFB5A899FA5AE9F24117C4B",
    "1FE649286651ECE45B3DC2007CB8A163BF0598DA48361C55D39A69",
    "163FA8FD24CF5F83655D23DCA3AD961C62F356208552BB9ED529077",
    "096966D670C354E4ABC9804F1746C08CA18217C32905E462E36CE3",
    "BE39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BC",
    "BF6955817183995497CEA956AE515D2261898FA051015728E5A8AA",
    "CAA68FFFFFFFFFFFFFFFF",
);

static MODULUS: Lazy<BigUint> = Lazy::new(|| {
    BigUint::parse_bytes(MODULUS_HEX.as_bytes(), 16).expect("static modulus is valid hex")
});

/// The prime-order subgroup order, `q = (p - 1) / 2`.
static SUBGROUP_ORDER: Lazy<BigUint> = Lazy::new(|| (&*MODULUS - BigUint::one()) / BigUint::from(2u8));

static GENERATOR: Lazy<BigUint> = Lazy::new(|| BigUint::from(2u8));

pub fn modulus() -> &'static BigUint {
    &MODULUS
}

pub fn subgroup_order() -> &'static BigUint {
    &SUBGROUP_ORDER
}

pub fn generator() -> &'static BigUint {
    &GENERATOR
}

/// `g^exp mod p`.
pub fn exp(exponent: &BigUint) -> BigUint {
    GENERATOR.modpow(exponent, &MODULUS)
}

/// `base^exp mod p`.
pub fn pow_mod(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    base.modpow(exponent, modulus)
}

/// A uniformly random exponent in `[0, q)`, read through the injected
/// random source. Rejection-samples against an oversized byte buffer
/// reduced modulo `q`, matching how the reference implementation draws
/// DH blinding exponents from the same `WithRandom` contract used for
/// Ed448 scalars.
pub fn random_exponent(source: &dyn WithRandom) -> Result<BigUint, CryptoError> {
    let byte_len = (SUBGROUP_ORDER.bits() as usize) / 8 + 16;
    let mut buf = vec![0u8; byte_len];
    crate::rand::random_into(source, &mut buf)?;
    let raw = BigUint::from_bytes_be(&buf);
    Ok(raw % &*SUBGROUP_ORDER)
}

/// Checks that `value` is a valid public value in `(1, p-1)` and lies in
/// the prime-order subgroup, i.e. `value^q mod p == 1`.
pub fn is_valid_public_value(value: &BigUint) -> bool {
    if value <= &BigUint::one() || value >= &(&*MODULUS - BigUint::one()) {
        return false;
    }
    pow_mod(value, &SUBGROUP_ORDER, &MODULUS) == *BigUint::one()
}

/// `mod q` reduction for proof responses, keeping results non-negative
/// in the absence of a signed-bigint representation.
pub fn reduce_mod_q(value: &num_bigint::BigInt) -> BigUint {
    use num_bigint::BigInt;
    let q = BigInt::from(SUBGROUP_ORDER.clone());
    let mut r = value % &q;
    if r < BigInt::zero() {
        r += &q;
    }
    r.to_biguint().expect("non-negative by construction")
}
