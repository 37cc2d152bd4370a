use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProofError {
    #[error("proof invalid")]
    ProofInvalid,

    #[error("empty list of values")]
    EmptyValueList,

    #[error("short random read")]
    ShortRandomRead,
}

impl From<otrp_crypto::CryptoError> for ProofError {
    fn from(e: otrp_crypto::CryptoError) -> Self {
        match e {
            otrp_crypto::CryptoError::ShortRandomRead => ProofError::ShortRandomRead,
            _ => ProofError::ProofInvalid,
        }
    }
}
