//! Selects a storage backend from a spec string: `"in-memory"` or
//! `"dir:<path>"`.

use std::path::Path;
use std::sync::Arc;

use crate::dir::DirStore;
use crate::error::StoreError;
use crate::memory::InMemoryStore;
use crate::EnsembleStore;

pub fn open(spec: &str) -> Result<Arc<dyn EnsembleStore>, StoreError> {
    if spec == "in-memory" {
        return Ok(Arc::new(InMemoryStore::new()));
    }
    if let Some(path) = spec.strip_prefix("dir:") {
        return Ok(Arc::new(DirStore::open(Path::new(path))?));
    }
    Err(StoreError::UnknownStorageType)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_spec_is_rejected() {
        let r = open("something-else");
        assert!(matches!(r, Err(StoreError::UnknownStorageType)));
    }

    #[test]
    fn missing_directory_is_rejected() {
        let r = open("dir:/nonexistent/path/for/otrp-store-tests");
        assert!(matches!(r, Err(StoreError::DirectoryDoesntExist)));
    }

    #[test]
    fn in_memory_opens() {
        assert!(open("in-memory").is_ok());
    }
}
