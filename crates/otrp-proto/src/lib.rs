//! otrp_proto — fragmentation, framing, and message wire types for the
//! OTRv4 prekey server protocol.
//!
//! # Modules
//! - `fragment`  — splits/reassembles oversized frames
//! - `framing`   — base64 + punctuation framing
//! - `messages`  — DAKE, storage-info, ensemble-retrieval and publication wire types, and the dispatcher
//! - `types`     — client profiles, prekey profiles, prekey messages, ensembles
//! - `error`     — `ProtoError`

pub mod error;
pub mod fragment;
pub mod framing;
pub mod messages;
pub mod types;

pub use error::ProtoError;
pub use fragment::Fragmentor;
pub use messages::{decode_inbound, InboundMessage, PROTOCOL_VERSION};
