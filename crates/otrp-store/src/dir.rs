//! On-disk ensemble store: one directory per `(identity, instance tag)`,
//! holding the wire-encoded profiles and one file per unused prekey
//! message. Selected with a `dir:<path>` storage spec.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use otrp_proto::types::{ClientProfile, PrekeyEnsemble, PrekeyMessage, PrekeyProfile};

use crate::error::StoreError;
use crate::EnsembleStore;

pub struct DirStore {
    base: PathBuf,
    // Writes are serialized process-wide, matching the single
    // exclusive lock the rest of the server uses for store mutations.
    lock: Mutex<()>,
}

impl DirStore {
    pub fn open(base: &Path) -> Result<Self, StoreError> {
        if !base.is_dir() {
            return Err(StoreError::DirectoryDoesntExist);
        }
        Ok(DirStore {
            base: base.to_path_buf(),
            lock: Mutex::new(()),
        })
    }

    fn tag_dir(&self, id: &str, tag: u32) -> PathBuf {
        self.base.join(id).join(format!("{tag:08x}"))
    }

    fn messages_dir(&self, id: &str, tag: u32) -> PathBuf {
        self.tag_dir(id, tag).join("messages")
    }

    fn identities(&self) -> Result<Vec<String>, StoreError> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.base)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    out.push(name.to_string());
                }
            }
        }
        Ok(out)
    }

    fn tags_for(&self, id: &str) -> Result<Vec<u32>, StoreError> {
        let dir = self.base.join(id);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    if let Ok(tag) = u32::from_str_radix(name, 16) {
                        out.push(tag);
                    }
                }
            }
        }
        Ok(out)
    }

    fn read_client_profile(&self, id: &str, tag: u32) -> Result<Option<ClientProfile>, StoreError> {
        let path = self.tag_dir(id, tag).join("client_profile.bin");
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path)?;
        Ok(Some(ClientProfile::decode(&bytes)?))
    }

    fn read_prekey_profile(&self, id: &str, tag: u32) -> Result<Option<PrekeyProfile>, StoreError> {
        let path = self.tag_dir(id, tag).join("prekey_profile.bin");
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path)?;
        Ok(Some(PrekeyProfile::decode(&bytes)?))
    }

    fn message_ids(&self, id: &str, tag: u32) -> Result<Vec<u32>, StoreError> {
        let dir = self.messages_dir(id, tag);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
                if let Ok(identifier) = stem.parse::<u32>() {
                    out.push(identifier);
                }
            }
        }
        out.sort_unstable();
        Ok(out)
    }
}

impl EnsembleStore for DirStore {
    fn store_client_profile(
        &self,
        id: &str,
        tag: u32,
        cp: ClientProfile,
        now: u64,
    ) -> Result<(), StoreError> {
        if cp.is_expired(now) {
            return Err(StoreError::ProfileExpired);
        }
        let _guard = self.lock.lock().unwrap();
        let dir = self.tag_dir(id, tag);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("client_profile.bin"), cp.encode())?;
        Ok(())
    }

    fn store_prekey_profile(
        &self,
        id: &str,
        tag: u32,
        pp: PrekeyProfile,
        now: u64,
    ) -> Result<(), StoreError> {
        if pp.is_expired(now) {
            return Err(StoreError::ProfileExpired);
        }
        let _guard = self.lock.lock().unwrap();
        let dir = self.tag_dir(id, tag);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("prekey_profile.bin"), pp.encode())?;
        Ok(())
    }

    fn store_prekey_messages(
        &self,
        id: &str,
        tag: u32,
        messages: Vec<PrekeyMessage>,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap();
        let dir = self.messages_dir(id, tag);
        fs::create_dir_all(&dir)?;
        for pm in messages {
            let path = dir.join(format!("{}.bin", pm.identifier));
            if path.exists() {
                continue;
            }
            fs::write(path, pm.encode())?;
        }
        Ok(())
    }

    fn client_profile(&self, id: &str, tag: u32) -> Option<ClientProfile> {
        self.read_client_profile(id, tag).ok().flatten()
    }

    fn retrieve_for(
        &self,
        id: &str,
        versions: &[u8],
        now: u64,
    ) -> Result<Vec<PrekeyEnsemble>, StoreError> {
        let _guard = self.lock.lock().unwrap();
        let tags = self.tags_for(id)?;
        let mut ensembles = Vec::new();

        for tag in tags {
            let Some(cp) = self.read_client_profile(id, tag)? else {
                continue;
            };
            if cp.is_expired(now) {
                continue;
            }
            if !cp.advertises_any_version(versions) {
                continue;
            }
            let Some(pp) = self.read_prekey_profile(id, tag)? else {
                continue;
            };
            if pp.is_expired(now) {
                continue;
            }
            let ids = self.message_ids(id, tag)?;
            let Some(&oldest) = ids.first() else {
                continue;
            };
            let path = self.messages_dir(id, tag).join(format!("{oldest}.bin"));
            let bytes = fs::read(&path)?;
            let pm = PrekeyMessage::decode(&bytes)?;
            fs::remove_file(&path)?;

            ensembles.push(PrekeyEnsemble {
                client_profile: cp,
                prekey_profile: pp,
                prekey_message: pm,
            });
        }

        if ensembles.is_empty() {
            return Err(StoreError::NoEnsembles);
        }
        Ok(ensembles)
    }

    fn status(&self, id: &str, _now: u64) -> u32 {
        let Ok(tags) = self.tags_for(id) else {
            return 0;
        };
        tags.iter()
            .map(|&tag| self.message_ids(id, tag).map(|ids| ids.len() as u32).unwrap_or(0))
            .sum()
    }

    fn sweep_expired(&self, now: u64) {
        let _guard = self.lock.lock().unwrap();
        let Ok(identities) = self.identities() else {
            return;
        };
        for id in identities {
            let Ok(tags) = self.tags_for(&id) else { continue };
            for tag in tags {
                if let Ok(Some(cp)) = self.read_client_profile(&id, tag) {
                    if cp.is_expired(now) {
                        let _ = fs::remove_file(self.tag_dir(&id, tag).join("client_profile.bin"));
                    }
                }
                if let Ok(Some(pp)) = self.read_prekey_profile(&id, tag) {
                    if pp.is_expired(now) {
                        let _ = fs::remove_file(self.tag_dir(&id, tag).join("prekey_profile.bin"));
                    }
                }
            }
        }
    }
}
