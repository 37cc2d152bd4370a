//! otrp_store — the per-identity prekey ensemble inventory: expiration,
//! instance-tag indexing, one-shot consumption, pluggable persistence.
//!
//! Two backends implement [`EnsembleStore`]: [`memory::InMemoryStore`]
//! and [`dir::DirStore`]. Use [`spec::open`] to select one from a spec
//! string at startup.

use otrp_proto::types::{ClientProfile, PrekeyEnsemble, PrekeyMessage, PrekeyProfile};

pub mod dir;
pub mod error;
pub mod memory;
pub mod record;
pub mod spec;

pub use error::StoreError;
pub use spec::open;

/// Contract for a per-identity ensemble store, per §4.7.
pub trait EnsembleStore: Send + Sync {
    fn store_client_profile(
        &self,
        id: &str,
        tag: u32,
        cp: ClientProfile,
        now: u64,
    ) -> Result<(), StoreError>;

    fn store_prekey_profile(
        &self,
        id: &str,
        tag: u32,
        pp: PrekeyProfile,
        now: u64,
    ) -> Result<(), StoreError>;

    fn store_prekey_messages(
        &self,
        id: &str,
        tag: u32,
        messages: Vec<PrekeyMessage>,
    ) -> Result<(), StoreError>;

    /// The client profile currently on file for `(id, tag)`, used to
    /// resolve the signing key for a publication that doesn't re-include
    /// its own client profile.
    fn client_profile(&self, id: &str, tag: u32) -> Option<ClientProfile>;

    fn retrieve_for(
        &self,
        id: &str,
        versions: &[u8],
        now: u64,
    ) -> Result<Vec<PrekeyEnsemble>, StoreError>;

    fn status(&self, id: &str, now: u64) -> u32;

    /// Proactive expiration sweep, run by the periodic maintenance task.
    fn sweep_expired(&self, now: u64);
}
