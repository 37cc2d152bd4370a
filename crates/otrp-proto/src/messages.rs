//! Inbound/outbound wire message types and the message dispatcher.
//!
//! `PROTOCOL_VERSION` and the type codes below are pinned by the
//! protocol; every frame starts with `u16 version ‖ u8 type`.

use num_bigint::BigUint;
use otrp_crypto::ed448::Point;
use otrp_crypto::kdf::Usage;
use otrp_proof::{dh as dh_proof, ecdh as ecdh_proof};
use otrp_wire::{Decoder, Encoder, WireError};

use crate::error::ProtoError;
use crate::types::{ClientProfile, PrekeyEnsemble, PrekeyMessage, PrekeyProfile};

pub const PROTOCOL_VERSION: u16 = 0x0004;

pub const TYPE_PUBLICATION: u8 = 0x08;
pub const TYPE_STORAGE_INFO_REQUEST: u8 = 0x09;
pub const TYPE_STORAGE_STATUS: u8 = 0x0B;
pub const TYPE_ENSEMBLE_RETRIEVAL_QUERY: u8 = 0x10;
pub const TYPE_ENSEMBLE_RETRIEVAL_MESSAGE: u8 = 0x11;
pub const TYPE_DAKE1: u8 = 0x35;
pub const TYPE_DAKE2: u8 = 0x36;
pub const TYPE_DAKE3: u8 = 0x37;

fn check_version(d: &mut Decoder) -> Result<(), ProtoError> {
    let version = d.read_u16()?;
    if version != PROTOCOL_VERSION {
        return Err(ProtoError::UnsupportedVersion);
    }
    Ok(())
}

fn header(type_code: u8) -> Encoder {
    let mut e = Encoder::new();
    e.write_u16(PROTOCOL_VERSION);
    e.write_u8(type_code);
    e
}

/// The client's opening move: its client profile and an ephemeral
/// public key `I`.
pub struct Dake1Message {
    pub instance_tag: u32,
    pub client_profile: ClientProfile,
    pub i: Point,
}

impl Dake1Message {
    pub fn decode_body(d: &mut Decoder) -> Result<Self, WireError> {
        let instance_tag = d.read_u32()?;
        let cp_bytes = d.read_data()?;
        let client_profile = ClientProfile::decode(&cp_bytes)?;
        let i_bytes = d.read_point()?;
        let i = Point::from_bytes(&i_bytes).map_err(|_| WireError::MalformedInput)?;
        Ok(Dake1Message {
            instance_tag,
            client_profile,
            i,
        })
    }
}

/// The server's reply: its identity string, ephemeral public key `S`,
/// and a signature over the transcript hash.
pub struct Dake2Message {
    pub instance_tag: u32,
    pub server_identity: Vec<u8>,
    pub s: Point,
    pub sigma: [u8; 114],
}

impl Dake2Message {
    pub fn encode(&self) -> Vec<u8> {
        let mut e = header(TYPE_DAKE2);
        e.write_u32(self.instance_tag);
        e.write_data(&self.server_identity);
        e.write_point(&self.s.to_bytes());
        e.write_data(&self.sigma);
        e.into_bytes()
    }
}

/// The client's closing move: its ring signature over the transcript,
/// and the embedded publication message.
pub struct Dake3Message {
    pub instance_tag: u32,
    pub sigma: Vec<u8>,
    pub publication: PublicationMessage,
}

impl Dake3Message {
    pub fn decode_body(d: &mut Decoder) -> Result<Self, WireError> {
        let instance_tag = d.read_u32()?;
        let sigma = d.read_data()?;
        let publication_bytes = d.read_data()?;
        let publication = PublicationMessage::decode(&publication_bytes)?;
        Ok(Dake3Message {
            instance_tag,
            sigma,
            publication,
        })
    }
}

/// A publication message: optionally a (re)published client profile and
/// prekey profile, plus a batch of one-shot prekey messages authenticated
/// by one Ed448 proof (over the `Y_i`) and one DH proof (over the `B_i`).
pub struct PublicationMessage {
    pub client_profile: Option<ClientProfile>,
    pub prekey_profile: Option<PrekeyProfile>,
    pub prekey_messages: Vec<PrekeyMessage>,
    pub ecdh_proof: ecdh_proof::EcdhProof,
    pub dh_proof: dh_proof::DhProof,
}

/// Publications never carry more than this many one-shot prekey messages
/// in a single batch — bounded by the proof engine's own list-size limit,
/// since every prekey message in the batch is one entry in both proofs.
pub const MAX_PREKEYS_PER_PUBLICATION: usize = ecdh_proof::MAX_PROOF_VALUES;

impl PublicationMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut e = Encoder::new();
        match &self.client_profile {
            Some(cp) => {
                e.write_u8(1);
                e.write_data(&cp.encode());
            }
            None => {
                e.write_u8(0);
            }
        }
        match &self.prekey_profile {
            Some(pp) => {
                e.write_u8(1);
                e.write_data(&pp.encode());
            }
            None => {
                e.write_u8(0);
            }
        }
        e.write_u32(self.prekey_messages.len() as u32);
        for pm in &self.prekey_messages {
            e.write_data(&pm.encode());
        }
        e.write_data(&self.ecdh_proof.serialize());
        e.write_data(&self.dh_proof.serialize());
        e.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut d = Decoder::new(bytes);
        let client_profile = match d.read_u8()? {
            0 => None,
            _ => Some(ClientProfile::decode(&d.read_data()?)?),
        };
        let prekey_profile = match d.read_u8()? {
            0 => None,
            _ => Some(PrekeyProfile::decode(&d.read_data()?)?),
        };
        let count = d.read_u32()? as usize;
        let mut prekey_messages = Vec::with_capacity(count);
        for _ in 0..count {
            prekey_messages.push(PrekeyMessage::decode(&d.read_data()?)?);
        }
        let ecdh_proof_bytes = d.read_data()?;
        let ecdh_proof = ecdh_proof::EcdhProof::deserialize(&ecdh_proof_bytes)?;
        let dh_proof_bytes = d.read_data()?;
        let dh_proof = dh_proof::DhProof::deserialize(&dh_proof_bytes)?;
        Ok(PublicationMessage {
            client_profile,
            prekey_profile,
            prekey_messages,
            ecdh_proof,
            dh_proof,
        })
    }

    /// Runs every §4.8 acceptance criterion. `owner_public_key` is the
    /// client's long-term public key, either from the embedded client
    /// profile or a previously stored one. Rejects the whole publication
    /// atomically on the first failing criterion.
    pub fn validate(&self, owner_public_key: Point, now: u64) -> Result<(), ProtoError> {
        if let Some(cp) = &self.client_profile {
            if !cp.verify_signature() {
                return Err(ProtoError::SignatureInvalid);
            }
            if cp.is_expired(now) {
                return Err(ProtoError::ProfileExpired);
            }
            if cp.versions.is_empty() {
                return Err(ProtoError::SignatureInvalid);
            }
        }
        if let Some(pp) = &self.prekey_profile {
            if !pp.verify_signature(owner_public_key) {
                return Err(ProtoError::SignatureInvalid);
            }
            if pp.is_expired(now) {
                return Err(ProtoError::ProfileExpired);
            }
        }

        let count = self.prekey_messages.len();
        if count == 0 || count > MAX_PREKEYS_PER_PUBLICATION {
            return Err(ProtoError::PrekeyCountOutOfRange);
        }

        let ys: Vec<Point> = self.prekey_messages.iter().map(|pm| pm.y).collect();
        let bs: Vec<BigUint> = self.prekey_messages.iter().map(|pm| pm.b.clone()).collect();

        if !ecdh_proof::verify(&self.ecdh_proof, &ys, &[], Usage::ProofMessageEcdh) {
            return Err(ProtoError::ProofInvalid);
        }
        if !dh_proof::verify(&self.dh_proof, &bs, &[], Usage::ProofMessageDh) {
            return Err(ProtoError::ProofInvalid);
        }

        Ok(())
    }
}

/// Query for the storage status of a given identity's own prekey stock.
pub struct StorageInfoRequest {
    pub instance_tag: u32,
}

impl StorageInfoRequest {
    pub fn decode_body(d: &mut Decoder) -> Result<Self, WireError> {
        Ok(StorageInfoRequest {
            instance_tag: d.read_u32()?,
        })
    }
}

pub struct StorageStatusMessage {
    pub instance_tag: u32,
    pub stored_count: u32,
}

impl StorageStatusMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut e = header(TYPE_STORAGE_STATUS);
        e.write_u32(self.instance_tag);
        e.write_u32(self.stored_count);
        e.into_bytes()
    }
}

/// Request for an ensemble addressed to `identity`, restricted to the
/// listed protocol versions.
pub struct EnsembleRetrievalQuery {
    pub instance_tag: u32,
    pub identity: String,
    pub versions: Vec<u8>,
}

impl EnsembleRetrievalQuery {
    pub fn decode_body(d: &mut Decoder) -> Result<Self, WireError> {
        let instance_tag = d.read_u32()?;
        let identity_bytes = d.read_data()?;
        let identity = String::from_utf8(identity_bytes).map_err(|_| WireError::MalformedInput)?;
        let versions = d.read_data()?;
        Ok(EnsembleRetrievalQuery {
            instance_tag,
            identity,
            versions,
        })
    }
}

pub struct EnsembleRetrievalMessage {
    pub instance_tag: u32,
    pub ensembles: Vec<PrekeyEnsemble>,
}

impl EnsembleRetrievalMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut e = header(TYPE_ENSEMBLE_RETRIEVAL_MESSAGE);
        e.write_u32(self.instance_tag);
        e.write_u32(self.ensembles.len() as u32);
        for ens in &self.ensembles {
            e.write_data(&ens.encode());
        }
        e.into_bytes()
    }
}

/// A fully decoded, dispatched inbound message.
pub enum InboundMessage {
    Dake1(Dake1Message),
    Dake3(Dake3Message),
    StorageInfoRequest(StorageInfoRequest),
    EnsembleRetrievalQuery(EnsembleRetrievalQuery),
}

/// Checks the protocol version, reads the message-type byte, and routes
/// to the matching decoder. `UnknownMessageType` for anything else.
pub fn decode_inbound(body: &[u8]) -> Result<InboundMessage, ProtoError> {
    let mut d = Decoder::new(body);
    check_version(&mut d)?;
    let type_code = d.read_u8()?;
    match type_code {
        TYPE_DAKE1 => Ok(InboundMessage::Dake1(Dake1Message::decode_body(&mut d)?)),
        TYPE_DAKE3 => Ok(InboundMessage::Dake3(Dake3Message::decode_body(&mut d)?)),
        TYPE_STORAGE_INFO_REQUEST => Ok(InboundMessage::StorageInfoRequest(
            StorageInfoRequest::decode_body(&mut d)?,
        )),
        TYPE_ENSEMBLE_RETRIEVAL_QUERY => Ok(InboundMessage::EnsembleRetrievalQuery(
            EnsembleRetrievalQuery::decode_body(&mut d)?,
        )),
        _ => Err(ProtoError::UnknownMessageType),
    }
}
