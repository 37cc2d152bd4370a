use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtoError {
    #[error("empty message")]
    EmptyMessage,

    #[error("invalid message format - missing ending punctuation")]
    MalformedFrame,

    #[error("invalid message format - corrupted base64 encoding")]
    CorruptedBase64,

    #[error("invalid fragmentation parse")]
    InvalidFragmentationParse,

    #[error("unknown message type")]
    UnknownMessageType,

    #[error("unsupported protocol version")]
    UnsupportedVersion,

    #[error("malformed input")]
    MalformedInput,

    #[error("profile expired")]
    ProfileExpired,

    #[error("signature invalid")]
    SignatureInvalid,

    #[error("proof invalid")]
    ProofInvalid,

    #[error("prekey count out of range")]
    PrekeyCountOutOfRange,
}

impl From<otrp_proof::ProofError> for ProtoError {
    fn from(_: otrp_proof::ProofError) -> Self {
        ProtoError::ProofInvalid
    }
}

impl From<otrp_wire::WireError> for ProtoError {
    fn from(_: otrp_wire::WireError) -> Self {
        ProtoError::MalformedInput
    }
}
