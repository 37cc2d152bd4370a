//! The server façade: `Handle(from, message) -> [reply]`, ties the
//! fragmentor, framing layer, dispatcher, DAKE state machine, session
//! manager and ensemble store together.

use std::sync::{Arc, Mutex};

use otrp_crypto::ed448::KeyPair;
use otrp_crypto::rand::WithRandom;
use otrp_proto::fragment::{self, Fragmentor};
use otrp_proto::messages::{
    self, Dake1Message, Dake3Message, EnsembleRetrievalMessage, InboundMessage,
    StorageStatusMessage,
};
use otrp_proto::{decode_inbound, framing};
use otrp_store::EnsembleStore;

use crate::dake;
use crate::error::ServerError;
use crate::session::{DakePhase, Session, SessionManager};

pub struct Server {
    store: Arc<dyn EnsembleStore>,
    sessions: SessionManager,
    fragmentor: Mutex<Fragmentor>,
    source: Arc<dyn WithRandom>,
    keys: KeyPair,
    server_identity: Vec<u8>,
    server_instance_tag: u32,
    frag_len: usize,
    session_timeout_secs: u64,
    fragmentation_timeout_secs: u64,
    identity_prefixes: Vec<String>,
}

impl Server {
    pub fn new(
        store: Arc<dyn EnsembleStore>,
        source: Arc<dyn WithRandom>,
        keys: KeyPair,
        server_identity: Vec<u8>,
        server_instance_tag: u32,
        frag_len: usize,
        session_timeout_secs: u64,
        fragmentation_timeout_secs: u64,
        identity_prefixes: Vec<String>,
    ) -> Self {
        Server {
            store,
            sessions: SessionManager::new(),
            fragmentor: Mutex::new(Fragmentor::new()),
            source,
            keys,
            server_identity,
            server_instance_tag,
            frag_len,
            session_timeout_secs,
            fragmentation_timeout_secs,
            identity_prefixes,
        }
    }

    /// The only authorization this façade performs: when the restrictor
    /// list is non-empty, `from` must start with one of its entries. An
    /// empty list (the default) admits every identity.
    fn identity_is_authorized(&self, from: &str) -> bool {
        self.identity_prefixes.is_empty()
            || self
                .identity_prefixes
                .iter()
                .any(|prefix| from.starts_with(prefix.as_str()))
    }

    /// Processes exactly one inbound framed message and returns zero or
    /// more framed outbound messages.
    #[tracing::instrument(skip(self, message), fields(from))]
    pub fn handle(&self, from: &str, message: &str, now: u64) -> Result<Vec<String>, ServerError> {
        let result = self.handle_inner(from, message, now);
        if let Err(ref e) = result {
            tracing::warn!(from, error = %e, "handle failed");
        }
        result
    }

    fn handle_inner(&self, from: &str, message: &str, now: u64) -> Result<Vec<String>, ServerError> {
        if message.is_empty() {
            return Err(otrp_proto::ProtoError::EmptyMessage.into());
        }
        if !self.identity_is_authorized(from) {
            return Err(ServerError::IdentityNotAuthorized);
        }

        let body = if message.starts_with(fragment::PREFIX) {
            match self
                .fragmentor
                .lock()
                .unwrap()
                .reassemble(from, message, now)?
            {
                Some(bytes) => bytes,
                None => return Ok(Vec::new()),
            }
        } else {
            framing::deframe(message)?
        };

        self.sessions.touch(from, now);

        match self.dispatch(from, &body, now)? {
            Some((to_tag, bytes)) => {
                let whole = framing::frame_whole(&bytes);
                let pieces = fragment::split(
                    self.source.as_ref(),
                    self.frag_len,
                    self.server_instance_tag,
                    to_tag,
                    &whole,
                )?;
                Ok(pieces)
            }
            None => Ok(Vec::new()),
        }
    }

    fn dispatch(&self, from: &str, body: &[u8], now: u64) -> Result<Option<(u32, Vec<u8>)>, ServerError> {
        match decode_inbound(body)? {
            InboundMessage::Dake1(msg) => self.handle_dake1(from, &msg, now),
            InboundMessage::Dake3(msg) => self.handle_dake3(from, &msg, now),
            InboundMessage::StorageInfoRequest(req) => {
                let count = self.store.status(from, now);
                let reply = StorageStatusMessage {
                    instance_tag: req.instance_tag,
                    stored_count: count,
                };
                Ok(Some((req.instance_tag, reply.encode())))
            }
            InboundMessage::EnsembleRetrievalQuery(query) => {
                let ensembles = self
                    .store
                    .retrieve_for(&query.identity, &query.versions, now)?;
                let reply = EnsembleRetrievalMessage {
                    instance_tag: query.instance_tag,
                    ensembles,
                };
                Ok(Some((query.instance_tag, reply.encode())))
            }
        }
    }

    fn handle_dake1(
        &self,
        from: &str,
        msg: &Dake1Message,
        now: u64,
    ) -> Result<Option<(u32, Vec<u8>)>, ServerError> {
        if self.sessions.phase(from).is_some() {
            // A fresh DAKE-1 supersedes any in-flight handshake.
            self.sessions.remove(from);
        }
        let (session, reply) = dake::receive_dake1(
            msg,
            &self.keys,
            &self.server_identity,
            self.source.as_ref(),
            now,
        )?;
        self.sessions.create(from, session);
        Ok(Some((msg.instance_tag, reply.encode())))
    }

    fn handle_dake3(
        &self,
        from: &str,
        msg: &Dake3Message,
        now: u64,
    ) -> Result<Option<(u32, Vec<u8>)>, ServerError> {
        let verify_result = self
            .sessions
            .with_session(from, |session: &Session| {
                if session.phase != DakePhase::AwaitingDake3 {
                    return (Err(ServerError::DakeFailure), true);
                }
                (dake::receive_dake3(session, msg).map(|_| session.client_public_key), true)
            })
            .ok_or(ServerError::DakeFailure)?;

        let session_owner = verify_result?;
        let owner_public_key = msg
            .publication
            .client_profile
            .as_ref()
            .map(|cp| cp.public_key)
            .unwrap_or(session_owner);

        msg.publication.validate(owner_public_key, now)?;

        if let Some(cp) = msg.publication.client_profile.clone() {
            self.store.store_client_profile(from, msg.instance_tag, cp, now)?;
        }
        if let Some(pp) = msg.publication.prekey_profile.clone() {
            self.store.store_prekey_profile(from, msg.instance_tag, pp, now)?;
        }
        self.store.store_prekey_messages(
            from,
            msg.instance_tag,
            msg.publication.prekey_messages.clone(),
        )?;

        let stored_count = self.store.status(from, now);
        let reply = StorageStatusMessage {
            instance_tag: msg.instance_tag,
            stored_count,
        };
        Ok(Some((msg.instance_tag, reply.encode())))
    }

    pub fn has_session(&self, peer: &str) -> bool {
        self.sessions.has(peer)
    }

    /// Runs the periodic maintenance pass: session eviction, stale
    /// fragment reassembly eviction, and store expiration sweep.
    pub fn cleanup_after(&self, now: u64) {
        self.sessions.evict_older_than(now, self.session_timeout_secs);
        self.fragmentor
            .lock()
            .unwrap()
            .evict_stale(now, self.fragmentation_timeout_secs);
        self.store.sweep_expired(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otrp_crypto::rand::SystemRandom;
    use otrp_store::memory::InMemoryStore;

    fn test_server() -> Server {
        let keys = KeyPair::generate(&SystemRandom).unwrap();
        Server::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(SystemRandom),
            keys,
            b"prekey.example.org".to_vec(),
            0x0000_CAFE,
            0,
            30 * 60,
            60,
            Vec::new(),
        )
    }

    #[test]
    fn empty_message_is_rejected() {
        let server = test_server();
        let r = server.handle("alice", "", 0);
        assert!(matches!(
            r,
            Err(ServerError::Proto(otrp_proto::ProtoError::EmptyMessage))
        ));
    }

    #[test]
    fn storage_info_request_reports_zero_for_unknown_identity() {
        let server = test_server();
        let mut e = otrp_wire::Encoder::new();
        e.write_u16(messages::PROTOCOL_VERSION);
        e.write_u8(messages::TYPE_STORAGE_INFO_REQUEST);
        e.write_u32(7);
        let framed = framing::frame_whole(&e.into_bytes());

        let replies = server.handle("nobody", &framed, 0).unwrap();
        assert_eq!(replies.len(), 1);
    }

    #[test]
    fn cleanup_after_does_not_panic_on_an_idle_server() {
        let server = test_server();
        server.cleanup_after(10_000_000);
    }

    #[test]
    fn identity_restrictor_rejects_non_matching_prefixes() {
        let keys = KeyPair::generate(&SystemRandom).unwrap();
        let server = Server::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(SystemRandom),
            keys,
            b"prekey.example.org".to_vec(),
            0x0000_CAFE,
            0,
            30 * 60,
            60,
            vec!["allowed.".to_string()],
        );

        let mut e = otrp_wire::Encoder::new();
        e.write_u16(messages::PROTOCOL_VERSION);
        e.write_u8(messages::TYPE_STORAGE_INFO_REQUEST);
        e.write_u32(7);
        let framed = framing::frame_whole(&e.into_bytes());

        let r = server.handle("someone.else", &framed, 0);
        assert!(matches!(r, Err(ServerError::IdentityNotAuthorized)));

        let replies = server.handle("allowed.alice", &framed, 0).unwrap();
        assert_eq!(replies.len(), 1);
    }
}
