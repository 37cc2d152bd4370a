//! Client profiles, prekey profiles, prekey messages and ensembles: the
//! long-term and medium-lived identity material this server stores and
//! hands back out.
//!
//! DSA support is not implemented: the reference client profile carries
//! an optional legacy DSA public key and transitional signature for
//! backward compatibility with OTRv3, which this deployment does not
//! need to interoperate with.

use num_bigint::BigUint;
use otrp_crypto::ed448::{self, Point};
use otrp_wire::{Decoder, Encoder, WireError};

/// A long-term client identity certificate.
#[derive(Clone)]
pub struct ClientProfile {
    pub identifier: u32,
    pub instance_tag: u32,
    pub public_key: Point,
    pub versions: Vec<u8>,
    pub expiration: u64,
    pub signature: Vec<u8>,
}

impl ClientProfile {
    /// The fields covered by the self-signature, in wire order, not
    /// including the signature itself.
    fn signed_fields(&self) -> Vec<u8> {
        let mut e = Encoder::new();
        e.write_u32(self.identifier);
        e.write_u32(self.instance_tag);
        e.write_point(&self.public_key.to_bytes());
        e.write_data(&self.versions);
        e.write_time(self.expiration);
        e.into_bytes()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut e = Encoder::new();
        let fields = self.signed_fields();
        e.write_data(&fields);
        e.write_data(&self.signature);
        e.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut d = Decoder::new(bytes);
        let fields = d.read_data()?;
        let signature = d.read_data()?;

        let mut fd = Decoder::new(&fields);
        let identifier = fd.read_u32()?;
        let instance_tag = fd.read_u32()?;
        let public_key_bytes = fd.read_point()?;
        let public_key = Point::from_bytes(&public_key_bytes).map_err(|_| WireError::MalformedInput)?;
        let versions = fd.read_data()?;
        let expiration = fd.read_time()?;

        Ok(ClientProfile {
            identifier,
            instance_tag,
            public_key,
            versions,
            expiration,
            signature,
        })
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.expiration <= now
    }

    pub fn advertises_any_version(&self, wanted: &[u8]) -> bool {
        self.versions.iter().any(|v| wanted.contains(v))
    }

    pub fn verify_signature(&self) -> bool {
        if self.signature.len() != 114 {
            return false;
        }
        let mut sig = [0u8; 114];
        sig.copy_from_slice(&self.signature);
        let fields = self.signed_fields();
        ed448::verify(self.public_key, &fields, &sig).is_ok()
    }
}

/// A medium-lived prekey profile, signed by the owning client profile.
#[derive(Clone)]
pub struct PrekeyProfile {
    pub identifier: u32,
    pub instance_tag: u32,
    pub expiration: u64,
    pub shared_prekey: Point,
    pub signature: Vec<u8>,
}

impl PrekeyProfile {
    fn signed_fields(&self) -> Vec<u8> {
        let mut e = Encoder::new();
        e.write_u32(self.identifier);
        e.write_u32(self.instance_tag);
        e.write_time(self.expiration);
        e.write_point(&self.shared_prekey.to_bytes());
        e.into_bytes()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut e = Encoder::new();
        let fields = self.signed_fields();
        e.write_data(&fields);
        e.write_data(&self.signature);
        e.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut d = Decoder::new(bytes);
        let fields = d.read_data()?;
        let signature = d.read_data()?;

        let mut fd = Decoder::new(&fields);
        let identifier = fd.read_u32()?;
        let instance_tag = fd.read_u32()?;
        let expiration = fd.read_time()?;
        let shared_prekey_bytes = fd.read_point()?;
        let shared_prekey =
            Point::from_bytes(&shared_prekey_bytes).map_err(|_| WireError::MalformedInput)?;

        Ok(PrekeyProfile {
            identifier,
            instance_tag,
            expiration,
            shared_prekey,
            signature,
        })
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.expiration <= now
    }

    pub fn verify_signature(&self, owner_public_key: Point) -> bool {
        if self.signature.len() != 114 {
            return false;
        }
        let mut sig = [0u8; 114];
        sig.copy_from_slice(&self.signature);
        let fields = self.signed_fields();
        ed448::verify(owner_public_key, &fields, &sig).is_ok()
    }
}

/// One-shot key material: consumed at most once by a retrieval.
#[derive(Clone)]
pub struct PrekeyMessage {
    pub identifier: u32,
    pub instance_tag: u32,
    pub y: Point,
    pub b: BigUint,
}

impl PrekeyMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut e = Encoder::new();
        e.write_u32(self.identifier);
        e.write_u32(self.instance_tag);
        e.write_point(&self.y.to_bytes());
        e.write_mpi(&self.b.to_bytes_be());
        e.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut d = Decoder::new(bytes);
        let identifier = d.read_u32()?;
        let instance_tag = d.read_u32()?;
        let y_bytes = d.read_point()?;
        let y = Point::from_bytes(&y_bytes).map_err(|_| WireError::MalformedInput)?;
        let b_bytes = d.read_mpi()?;
        let b = BigUint::from_bytes_be(&b_bytes);
        Ok(PrekeyMessage {
            identifier,
            instance_tag,
            y,
            b,
        })
    }
}

/// A `(client profile, prekey profile, prekey message)` triple returned
/// together to a requester.
pub struct PrekeyEnsemble {
    pub client_profile: ClientProfile,
    pub prekey_profile: PrekeyProfile,
    pub prekey_message: PrekeyMessage,
}

impl PrekeyEnsemble {
    pub fn encode(&self) -> Vec<u8> {
        let mut e = Encoder::new();
        e.write_data(&self.client_profile.encode());
        e.write_data(&self.prekey_profile.encode());
        e.write_data(&self.prekey_message.encode());
        e.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut d = Decoder::new(bytes);
        let cp_bytes = d.read_data()?;
        let pp_bytes = d.read_data()?;
        let pm_bytes = d.read_data()?;
        Ok(PrekeyEnsemble {
            client_profile: ClientProfile::decode(&cp_bytes)?,
            prekey_profile: PrekeyProfile::decode(&pp_bytes)?,
            prekey_message: PrekeyMessage::decode(&pm_bytes)?,
        })
    }
}
