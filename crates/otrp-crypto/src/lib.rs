//! otrp_crypto — cryptographic primitive adapters for the OTRv4 prekey
//! server.
//!
//! # Design principles
//! - NO custom curve math; Ed448 arithmetic comes from `ed448-goldilocks`,
//!   the 3072-bit DH group from `num-bigint`'s modular exponentiation.
//! - All randomness flows through an injected `WithRandom` source so
//!   tests can pin exact byte outputs.
//! - Public APIs return opaque newtypes (`Scalar`, `Point`) sized exactly
//!   to the wire encodings the rest of the workspace expects.
//!
//! # Module layout
//! - `ed448` — Ed448 keypairs, points, scalars, EdDSA sign/verify
//! - `dh`    — the 3072-bit Diffie–Hellman group (RFC 3526 group 16)
//! - `kdf`   — the shared SHAKE-256 KDF with usage-tag domain separation
//! - `rand`  — the injected randomness contract (`WithRandom`)
//! - `error` — unified error type

pub mod dh;
pub mod ed448;
pub mod error;
pub mod kdf;
pub mod rand;

pub use error::CryptoError;
