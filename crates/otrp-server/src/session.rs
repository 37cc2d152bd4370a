//! Per-peer ephemeral DAKE state, with timeout-based eviction.

use std::collections::HashMap;
use std::sync::Mutex;

use otrp_crypto::ed448::{Point, Scalar};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DakePhase {
    AwaitingDake3,
    Done,
}

pub struct Session {
    pub phase: DakePhase,
    /// Locally generated ephemeral keypair (s, S).
    pub ephemeral_private: Scalar,
    pub ephemeral_public: Point,
    /// The client's long-term public key, learned from DAKE-1's client
    /// profile, kept around to verify DAKE-3's ring signature and to
    /// resolve ownership for a publication that omits its profile.
    pub client_public_key: Point,
    pub client_instance_tag: u32,
    pub transcript: [u8; 64],
    pub last_touched: u64,
}

/// A coarse-grained-locked table of in-flight handshakes, keyed by peer
/// identity string.
#[derive(Default)]
pub struct SessionManager {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, peer: &str, session: Session) {
        self.sessions.lock().unwrap().insert(peer.to_string(), session);
    }

    pub fn touch(&self, peer: &str, now: u64) {
        if let Some(s) = self.sessions.lock().unwrap().get_mut(peer) {
            s.last_touched = now;
        }
    }

    pub fn remove(&self, peer: &str) {
        self.sessions.lock().unwrap().remove(peer);
    }

    pub fn has(&self, peer: &str) -> bool {
        self.sessions.lock().unwrap().contains_key(peer)
    }

    pub fn phase(&self, peer: &str) -> Option<DakePhase> {
        self.sessions.lock().unwrap().get(peer).map(|s| s.phase)
    }

    /// Runs `f` against the session for `peer`, if any, returning its
    /// result. The closure is given a chance to consume the session
    /// (e.g. on DAKE-3 completion) by returning whether it should be
    /// removed afterward.
    pub fn with_session<R>(&self, peer: &str, f: impl FnOnce(&Session) -> (R, bool)) -> Option<R> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.get(peer)?;
        let (result, remove) = f(session);
        if remove {
            sessions.remove(peer);
        }
        Some(result)
    }

    /// Evicts every session whose `last_touched` predates
    /// `now - timeout_secs`.
    pub fn evict_older_than(&self, now: u64, timeout_secs: u64) {
        self.sessions
            .lock()
            .unwrap()
            .retain(|_, s| now.saturating_sub(s.last_touched) <= timeout_secs);
    }
}
