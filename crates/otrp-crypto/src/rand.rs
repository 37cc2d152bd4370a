//! Injected randomness.
//!
//! Every sampling operation in the proof engine and the DAKE state machine
//! reads through a `WithRandom` implementor rather than touching the OS
//! CSPRNG directly, so tests can substitute a fixed byte sequence and pin
//! exact proof outputs. Filling a buffer either succeeds completely or
//! fails with `ShortRandomRead` — there is no partial-fill success.

use rand::RngCore;
use rand_core::OsRng;

use crate::error::CryptoError;

/// A source of randomness that can be swapped out in tests.
pub trait WithRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CryptoError>;
}

/// Reads from the process CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRandom;

impl WithRandom for SystemRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        OsRng.fill_bytes(buf);
        Ok(())
    }
}

/// Replays a fixed byte sequence, failing with `ShortRandomRead` once
/// exhausted. Mirrors the reference test suite's deterministic fixture
/// random source, used to pin exact challenge/response byte outputs.
#[derive(Debug, Clone)]
pub struct FixtureRandom {
    bytes: Vec<u8>,
    cursor: std::cell::Cell<usize>,
}

impl FixtureRandom {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            cursor: std::cell::Cell::new(0),
        }
    }
}

impl WithRandom for FixtureRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        let start = self.cursor.get();
        let end = start + buf.len();
        if end > self.bytes.len() {
            return Err(CryptoError::ShortRandomRead);
        }
        buf.copy_from_slice(&self.bytes[start..end]);
        self.cursor.set(end);
        Ok(())
    }
}

/// Fills `buf` from `source`, the one entry point the rest of this crate
/// uses for randomness.
pub fn random_into(source: &dyn WithRandom, buf: &mut [u8]) -> Result<(), CryptoError> {
    source.fill(buf)
}
