use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("short random read")]
    ShortRandomRead,

    #[error("invalid point encoding")]
    InvalidPoint,

    #[error("invalid scalar encoding")]
    InvalidScalar,

    #[error("signature invalid")]
    SignatureInvalid,
}
