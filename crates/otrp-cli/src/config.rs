use std::path::PathBuf;

use serde::Deserialize;

/// The server's on-disk configuration, loaded from a TOML file and
/// overridable by a handful of command-line flags.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// The identity prefix this server answers for, e.g. "prekey.example.org".
    pub server_identity: String,
    pub server_instance_tag: u32,
    /// The pluggable identity-prefix restrictor: when non-empty, only
    /// `from` identities starting with one of these entries are served.
    /// Empty (the default) admits every identity, i.e. no restriction.
    #[serde(default)]
    pub identity_prefixes: Vec<String>,
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
    #[serde(default = "default_fragmentation_timeout_secs")]
    pub fragmentation_timeout_secs: u64,
    #[serde(default = "default_frag_len")]
    pub frag_len: usize,
    /// `"in-memory"` or `"dir:<path>"`, parsed by `otrp_store::open`.
    pub storage: String,
    pub keypair_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_session_timeout_secs() -> u64 {
    30 * 60
}

fn default_fragmentation_timeout_secs() -> u64 {
    60
}

fn default_frag_len() -> usize {
    0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&text)?;
        Ok(config)
    }
}
