use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Proto(#[from] otrp_proto::ProtoError),

    #[error(transparent)]
    Store(#[from] otrp_store::StoreError),

    #[error("dake failure")]
    DakeFailure,

    #[error("identity does not match any configured restrictor prefix")]
    IdentityNotAuthorized,

    #[error("short random read")]
    ShortRandomRead,

    #[error("couldn't decode symmetric key")]
    SymmetricKeyDecode,

    #[error("couldn't decode private key")]
    PrivateKeyDecode,

    #[error("couldn't decode public key")]
    PublicKeyDecode,

    #[error("couldn't decode scalar for private key")]
    PrivateScalarDecode,

    #[error("couldn't decode point for public key")]
    PublicPointDecode,
}

impl From<otrp_crypto::CryptoError> for ServerError {
    fn from(e: otrp_crypto::CryptoError) -> Self {
        match e {
            otrp_crypto::CryptoError::ShortRandomRead => ServerError::ShortRandomRead,
            _ => ServerError::DakeFailure,
        }
    }
}

impl From<otrp_proof::ProofError> for ServerError {
    fn from(e: otrp_proof::ProofError) -> Self {
        match e {
            otrp_proof::ProofError::ShortRandomRead => ServerError::ShortRandomRead,
            _ => ServerError::DakeFailure,
        }
    }
}
