//! otrp_proof — ring-style non-interactive zero-knowledge proofs of
//! knowledge of discrete log, over Ed448 and over the 3072-bit DH group.
//!
//! Both constructions share one shape: fold a list of private values
//! into a single response bound to a Fiat-Shamir challenge computed with
//! [`otrp_crypto::kdf`]. See [`ecdh`] for the Ed448 variant and [`dh`]
//! for the Diffie-Hellman variant.

pub mod dh;
pub mod ecdh;
pub mod error;

pub use error::ProofError;
