//! The single KDF used across the protocol: SHAKE-256 with a fixed
//! top-level domain separator, a one-byte usage tag, a context string,
//! and the actual input data.
//!
//! ```text
//! KDF(usage, ctx, outLen, data) = SHAKE-256("OTR-Prekey-Server" ‖ usage ‖ ctx ‖ data)[..outLen]
//! ```

use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256;

const DOMAIN: &[u8] = b"OTR-Prekey-Server";

/// Usage tags. A closed namespace; values are assigned once and never
/// reused for a different purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Usage {
    ProofMessageEcdh = 0x01,
    ProofSharedEcdh = 0x02,
    ProofMessageDh = 0x03,
    ProofSharedDh = 0x04,
    Dake1 = 0x05,
    Dake2 = 0x06,
    Dake3 = 0x07,
    PrekeyServerFingerprint = 0x08,
}

/// `KDF(usage, ctx, outLen, data)`, written into a caller-sized buffer.
pub fn kdf(usage: Usage, ctx: &[u8], data: &[u8], out: &mut [u8]) {
    let mut hasher = Shake256::default();
    hasher.update(DOMAIN);
    hasher.update(&[usage as u8]);
    hasher.update(ctx);
    hasher.update(data);
    let mut reader = hasher.finalize_xof();
    reader.read(out);
}

/// Convenience wrapper returning a fixed 64-byte digest, the size used
/// for every proof challenge and transcript hash in this protocol.
pub fn kdf64(usage: Usage, ctx: &[u8], data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    kdf(usage, ctx, data, &mut out);
    out
}
