//! Loading and saving the server's long-term keypair file.
//!
//! UTF-8 JSON object with three base64url fields: a 57-byte symmetric
//! key (used to derive the server fingerprint), a 56-byte Ed448 private
//! scalar, and a 57-byte compressed Ed448 public point.

use std::path::Path;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use otrp_crypto::ed448::{KeyPair, Point, Scalar, POINT_LEN, SCALAR_LEN};
use serde::{Deserialize, Serialize};

use crate::error::ServerError;

#[derive(Serialize, Deserialize)]
struct StoredKeyPairFile {
    #[serde(rename = "Symmetric")]
    symmetric: String,
    #[serde(rename = "Private")]
    private: String,
    #[serde(rename = "Public")]
    public: String,
}

pub struct StoredKeyPair {
    pub symmetric: [u8; 57],
    pub keypair: KeyPair,
}

pub fn load(path: &Path) -> Result<StoredKeyPair, ServerError> {
    let text = std::fs::read_to_string(path).map_err(|_| ServerError::PrivateKeyDecode)?;
    let file: StoredKeyPairFile =
        serde_json::from_str(text.trim_end()).map_err(|_| ServerError::PrivateKeyDecode)?;

    let symmetric_bytes = URL_SAFE
        .decode(&file.symmetric)
        .map_err(|_| ServerError::SymmetricKeyDecode)?;
    let symmetric: [u8; 57] = symmetric_bytes
        .try_into()
        .map_err(|_| ServerError::SymmetricKeyDecode)?;

    let private_bytes = URL_SAFE
        .decode(&file.private)
        .map_err(|_| ServerError::PrivateKeyDecode)?;
    let private_arr: [u8; SCALAR_LEN] = private_bytes
        .try_into()
        .map_err(|_| ServerError::PrivateKeyDecode)?;
    let private = Scalar::from_bytes(&private_arr).map_err(|_| ServerError::PrivateScalarDecode)?;

    let public_bytes = URL_SAFE
        .decode(&file.public)
        .map_err(|_| ServerError::PublicKeyDecode)?;
    let public_arr: [u8; POINT_LEN] = public_bytes
        .try_into()
        .map_err(|_| ServerError::PublicKeyDecode)?;
    let _public =
        Point::from_bytes(&public_arr).map_err(|_| ServerError::PublicPointDecode)?;

    let keypair = KeyPair::from_scalar(private).map_err(|_| ServerError::PrivateScalarDecode)?;

    Ok(StoredKeyPair { symmetric, keypair })
}

pub fn save(path: &Path, symmetric: &[u8; 57], keypair: &KeyPair) -> Result<(), ServerError> {
    let file = StoredKeyPairFile {
        symmetric: URL_SAFE.encode(symmetric),
        private: URL_SAFE.encode(keypair.private_scalar().to_bytes()),
        public: URL_SAFE.encode(keypair.public.to_bytes()),
    };
    let mut text = serde_json::to_string(&file).map_err(|_| ServerError::PrivateKeyDecode)?;
    text.push('\n');
    std::fs::write(path, text).map_err(|_| ServerError::PrivateKeyDecode)
}
