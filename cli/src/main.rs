mod commands;
mod keystore;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ots_config::{LogConfig, OtsConfig};

use crate::commands::{RoundOverrides, RunArgs};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "ots")]
#[command(about = "Ledger-authorized threshold secret release", long_about = None)]
struct Cli {
    /// Config file (defaults to OTS_CONFIG, ./ots.toml, ~/.ots/ots.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a local trustee cluster
    Keygen {
        #[arg(long, short = 'n')]
        count: usize,
        /// Group file to write
        #[arg(long, default_value = "group.toml")]
        group: PathBuf,
        /// Private key store to write
        #[arg(long, default_value = "keys.toml")]
        keys: PathBuf,
        /// Also write the public keys, one hex key per line
        #[arg(long)]
        publics: Option<PathBuf>,
    },
    /// Write a message, then read it back through the cluster
    Run {
        #[arg(long, default_value = "group.toml")]
        group: PathBuf,
        #[arg(long, default_value = "keys.toml")]
        keys: PathBuf,
        #[arg(long, short = 'm')]
        message: String,
        /// Root slot; random when omitted
        #[arg(long)]
        root: Option<usize>,
        /// Children per tree node; star when omitted
        #[arg(long)]
        branching: Option<usize>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Ledger committee size
        #[arg(long, default_value = "4")]
        committee: usize,
        /// Save the write record as JSON
        #[arg(long)]
        record_out: Option<PathBuf>,
    },
    /// Re-check the encrypted shares of a saved write record
    VerifyShares {
        #[arg(long)]
        record: PathBuf,
        /// Expected trustee keys, one hex key per line
        #[arg(long)]
        publics: Option<PathBuf>,
    },
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => OtsConfig::load_from(path)?,
        None => OtsConfig::load()?,
    };
    OtsConfig::set_global(loaded).map_err(|_| anyhow!("config already initialized"))?;
    let config = OtsConfig::global();
    init_tracing(&config.log);

    match cli.command {
        Command::Keygen {
            count,
            group,
            keys,
            publics,
        } => commands::keygen(count, &group, &keys, publics.as_deref()),
        Command::Run {
            group,
            keys,
            message,
            root,
            branching,
            timeout_ms,
            committee,
            record_out,
        } => {
            let args = RunArgs {
                group,
                keys,
                message,
                committee,
                record_out,
                round: RoundOverrides {
                    root,
                    branching,
                    timeout_ms,
                },
            };
            let plaintext = commands::run(args, config).await?;
            println!("{}", String::from_utf8_lossy(&plaintext));
            Ok(())
        }
        Command::VerifyShares { record, publics } => {
            let valid = commands::verify_shares(&record, publics.as_deref())?;
            println!("{} valid shares: {:?}", valid.len(), valid);
            Ok(())
        }
    }
}
