//! In-memory ensemble store: a single coarse-grained lock over a
//! `identity -> instance tag -> record` table, matching the
//! "parallel with coarse-grained locking" concurrency model.

use std::collections::HashMap;
use std::sync::Mutex;

use otrp_proto::types::{ClientProfile, PrekeyEnsemble, PrekeyMessage, PrekeyProfile};

use crate::error::StoreError;
use crate::record::StorageRecord;
use crate::EnsembleStore;

#[derive(Default)]
pub struct InMemoryStore {
    identities: Mutex<HashMap<String, HashMap<u32, StorageRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EnsembleStore for InMemoryStore {
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
        let mut identities = self.identities.lock().unwrap();
        let record = identities.entry(id.to_string()).or_default().entry(tag).or_default();
        record.client_profile = Some(cp);
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
        let mut identities = self.identities.lock().unwrap();
        let record = identities.entry(id.to_string()).or_default().entry(tag).or_default();
        record.prekey_profile = Some(pp);
        Ok(())
    }

    fn store_prekey_messages(
        &self,
        id: &str,
        tag: u32,
        messages: Vec<PrekeyMessage>,
    ) -> Result<(), StoreError> {
        let mut identities = self.identities.lock().unwrap();
        let record = identities.entry(id.to_string()).or_default().entry(tag).or_default();
        record.append_prekey_messages(messages);
        Ok(())
    }

    fn client_profile(&self, id: &str, tag: u32) -> Option<ClientProfile> {
        let identities = self.identities.lock().unwrap();
        identities.get(id)?.get(&tag)?.client_profile.clone()
    }

    fn retrieve_for(
        &self,
        id: &str,
        versions: &[u8],
        now: u64,
    ) -> Result<Vec<PrekeyEnsemble>, StoreError> {
        let mut identities = self.identities.lock().unwrap();
        let Some(tags) = identities.get_mut(id) else {
            return Err(StoreError::NoEnsembles);
        };

        let mut ensembles = Vec::new();
        for record in tags.values_mut() {
            record.evict_expired(now);
            let (Some(cp), Some(pp)) = (&record.client_profile, &record.prekey_profile) else {
                continue;
            };
            if !cp.advertises_any_version(versions) {
                continue;
            }
            let Some(pm) = record.take_oldest_prekey_message() else {
                continue;
            };
            ensembles.push(PrekeyEnsemble {
                client_profile: cp.clone(),
                prekey_profile: pp.clone(),
                prekey_message: pm,
            });
        }

        if ensembles.is_empty() {
            return Err(StoreError::NoEnsembles);
        }
        Ok(ensembles)
    }

    fn status(&self, id: &str, now: u64) -> u32 {
        let mut identities = self.identities.lock().unwrap();
        let Some(tags) = identities.get_mut(id) else {
            return 0;
        };
        tags.values_mut()
            .map(|record| {
                record.evict_expired(now);
                record.prekey_messages.len() as u32
            })
            .sum()
    }

    fn sweep_expired(&self, now: u64) {
        let mut identities = self.identities.lock().unwrap();
        for tags in identities.values_mut() {
            for record in tags.values_mut() {
                record.evict_expired(now);
            }
            tags.retain(|_, record| !record.is_empty());
        }
        identities.retain(|_, tags| !tags.is_empty());
    }
}
