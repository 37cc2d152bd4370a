use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use otrp_crypto::ed448::KeyPair;
use otrp_crypto::rand::SystemRandom;
use otrp_server::Server;

mod config;

use config::ServerConfig;

#[derive(Parser)]
#[command(name = "otrp-cli")]
#[command(about = "OTRv4 prekey server wiring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh long-term keypair file.
    Keygen {
        #[arg(long)]
        keypair_path: PathBuf,
    },
    /// Load configuration, build the server façade, and process
    /// newline-delimited `<from>\t<message>` requests from stdin until
    /// EOF. Transport binding is left to an external collaborator;
    /// this is wiring plus a minimal harness for local exercise.
    Run {
        #[arg(long)]
        config: PathBuf,
    },
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn keygen(keypair_path: &PathBuf) -> Result<()> {
    let keys = KeyPair::generate(&SystemRandom).context("generating server keypair")?;
    let mut symmetric = [0u8; 57];
    SystemRandom
        .fill(&mut symmetric)
        .context("sampling server fingerprint seed")?;
    otrp_server::keypair::save(keypair_path, &symmetric, &keys)
        .context("writing keypair file")?;
    println!("keypair written to {}", keypair_path.display());
    Ok(())
}

fn run(config_path: &PathBuf) -> Result<()> {
    let config = ServerConfig::load(config_path).context("loading server configuration")?;
    init_logging(&config.log_level);

    let stored = otrp_server::keypair::load(&config.keypair_path)
        .map_err(|e| anyhow::anyhow!(e))
        .context("loading server keypair")?;

    let store = otrp_store::open(&config.storage).context("opening storage backend")?;

    let server = Server::new(
        store,
        Arc::new(SystemRandom),
        stored.keypair,
        config.server_identity.clone().into_bytes(),
        config.server_instance_tag,
        config.frag_len,
        config.session_timeout_secs,
        config.fragmentation_timeout_secs,
        config.identity_prefixes.clone(),
    );

    tracing::info!(identity = %config.server_identity, "otrp-cli wired up, reading requests from stdin");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let Some((from, message)) = line.split_once('\t') else {
            tracing::warn!("ignoring malformed line, expected <from>\\t<message>");
            continue;
        };
        let now = now_unix();
        match server.handle(from, message, now) {
            Ok(replies) => {
                for reply in replies {
                    println!("{reply}");
                }
            }
            Err(e) => tracing::warn!(from, error = %e, "request failed"),
        }
        server.cleanup_after(now);
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Keygen { keypair_path } => keygen(&keypair_path),
        Commands::Run { config } => run(&config),
    }
}
