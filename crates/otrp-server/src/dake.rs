//! The non-interactive DAKE variant used for publication: `Idle →
//! AwaitingDake3 → Done`.
//!
//! The client's closing signature is verified as a standard Ed448
//! signature by the client's long-term key over the transcript hash —
//! the full three-party deniable ring-signature construction OTRv4
//! specifies for its DAKEZ handshake is out of scope here; see
//! `DESIGN.md`.

use otrp_crypto::ed448::{self, KeyPair, Point};
use otrp_crypto::kdf::{kdf, kdf64, Usage};
use otrp_crypto::rand::WithRandom;
use otrp_proto::messages::{Dake1Message, Dake2Message, Dake3Message};

use crate::error::ServerError;
use crate::session::{DakePhase, Session};

pub fn server_fingerprint(public: Point) -> [u8; 56] {
    let mut out = [0u8; 56];
    kdf(Usage::PrekeyServerFingerprint, b"", &public.to_bytes(), &mut out);
    out
}

fn transcript(
    client_profile_bytes: &[u8],
    i: Point,
    s: Point,
    server_identity: &[u8],
    server_fingerprint: &[u8; 56],
) -> [u8; 64] {
    let mut data = Vec::with_capacity(client_profile_bytes.len() + 57 * 2 + server_identity.len() + 56);
    data.extend_from_slice(client_profile_bytes);
    data.extend_from_slice(&i.to_bytes());
    data.extend_from_slice(&s.to_bytes());
    data.extend_from_slice(server_identity);
    data.extend_from_slice(server_fingerprint);
    kdf64(Usage::Dake1, b"", &data)
}

/// Processes an inbound DAKE-1 in the `Idle` state: validates the
/// client profile, samples the server's ephemeral keypair, and produces
/// the DAKE-2 reply plus the session to park until DAKE-3 arrives.
pub fn receive_dake1(
    msg: &Dake1Message,
    server_keys: &KeyPair,
    server_identity: &[u8],
    source: &dyn WithRandom,
    now: u64,
) -> Result<(Session, Dake2Message), ServerError> {
    if !msg.client_profile.verify_signature() {
        return Err(ServerError::DakeFailure);
    }
    if msg.client_profile.is_expired(now) {
        return Err(ServerError::DakeFailure);
    }
    if msg.client_profile.versions.is_empty() {
        return Err(ServerError::DakeFailure);
    }

    let ephemeral = KeyPair::generate(source)?;
    let fingerprint = server_fingerprint(server_keys.public);
    let t1 = transcript(
        &msg.client_profile.encode(),
        msg.i,
        ephemeral.public,
        server_identity,
        &fingerprint,
    );
    let sigma = server_keys.sign(&t1);

    let session = Session {
        phase: DakePhase::AwaitingDake3,
        ephemeral_private: ephemeral.private_scalar(),
        ephemeral_public: ephemeral.public,
        client_public_key: msg.client_profile.public_key,
        client_instance_tag: msg.instance_tag,
        transcript: t1,
        last_touched: now,
    };

    let reply = Dake2Message {
        instance_tag: msg.instance_tag,
        server_identity: server_identity.to_vec(),
        s: ephemeral.public,
        sigma,
    };

    Ok((session, reply))
}

/// Verifies DAKE-3's closing signature against the parked session's
/// transcript. On success the caller proceeds to validate and apply
/// the embedded publication message.
pub fn receive_dake3(session: &Session, msg: &Dake3Message) -> Result<(), ServerError> {
    if session.phase != DakePhase::AwaitingDake3 {
        return Err(ServerError::DakeFailure);
    }
    if msg.sigma.len() != 114 {
        return Err(ServerError::DakeFailure);
    }
    let mut sig = [0u8; 114];
    sig.copy_from_slice(&msg.sigma);
    ed448::verify(session.client_public_key, &session.transcript, &sig)
        .map_err(|_| ServerError::DakeFailure)
}
