//! Per-`(identity, instance tag)` storage record: at most one client
//! profile, at most one prekey profile, an ordered set of one-shot
//! prekey messages.

use otrp_proto::types::{ClientProfile, PrekeyMessage, PrekeyProfile};

#[derive(Default)]
pub struct StorageRecord {
    pub client_profile: Option<ClientProfile>,
    pub prekey_profile: Option<PrekeyProfile>,
    pub prekey_messages: Vec<PrekeyMessage>,
}

impl StorageRecord {
    /// Drops items whose expiration is at or before `now`. Prekey
    /// messages themselves have no expiration (they die on consumption),
    /// so only the two profiles are swept here.
    pub fn evict_expired(&mut self, now: u64) {
        if let Some(cp) = &self.client_profile {
            if cp.is_expired(now) {
                self.client_profile = None;
            }
        }
        if let Some(pp) = &self.prekey_profile {
            if pp.is_expired(now) {
                self.prekey_profile = None;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.client_profile.is_none() && self.prekey_profile.is_none() && self.prekey_messages.is_empty()
    }

    /// Inserts new prekey messages, deduplicated by identifier.
    pub fn append_prekey_messages(&mut self, messages: Vec<PrekeyMessage>) {
        for pm in messages {
            if !self.prekey_messages.iter().any(|existing| existing.identifier == pm.identifier) {
                self.prekey_messages.push(pm);
            }
        }
    }

    /// Removes and returns the oldest (lowest-identifier) unused prekey
    /// message, if any.
    pub fn take_oldest_prekey_message(&mut self) -> Option<PrekeyMessage> {
        if self.prekey_messages.is_empty() {
            return None;
        }
        let (idx, _) = self
            .prekey_messages
            .iter()
            .enumerate()
            .min_by_key(|(_, pm)| pm.identifier)?;
        Some(self.prekey_messages.remove(idx))
    }
}
