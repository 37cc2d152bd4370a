use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("profile expired")]
    ProfileExpired,

    #[error("no ensembles")]
    NoEnsembles,

    #[error("unknown storage type")]
    UnknownStorageType,

    #[error("directory doesn't exist")]
    DirectoryDoesntExist,

    #[error("storage failure: {0}")]
    StorageFailure(#[from] std::io::Error),

    #[error("malformed input")]
    MalformedInput,
}

impl From<otrp_wire::WireError> for StoreError {
    fn from(_: otrp_wire::WireError) -> Self {
        StoreError::MalformedInput
    }
}
