use crate::constants::DEFAULT_LISTEN_ADDR;
use anyhow::{Context, Result};
use clap::Parser;
use ledger_core::{ChainConfig, MiningStrategy};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "HTTP node for the proof-of-work ledger")]
pub struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: String,

    /// TOML file with chain settings; the flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Leading zero hex digits required in a block hash
    #[arg(long)]
    pub difficulty: Option<usize>,

    /// Maximum transactions per mined block
    #[arg(long)]
    pub max_batch: Option<usize>,

    /// Give up on a block after this many milliseconds
    #[arg(long)]
    pub mining_timeout_ms: Option<u64>,

    /// Search nonces on all cores
    #[arg(long)]
    pub parallel: bool,
}

impl Args {
    pub fn chain_config(&self) -> Result<ChainConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ChainConfig::default(),
        };
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(max_batch) = self.max_batch {
            config.max_batch_size = Some(max_batch);
        }
        if let Some(timeout) = self.mining_timeout_ms {
            config.mining_timeout_ms = Some(timeout);
        }
        if self.parallel {
            config.strategy = MiningStrategy::Parallel;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn load_config(path: &Path) -> Result<ChainConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse_config(&text).with_context(|| format!("parsing config file {}", path.display()))
}

pub fn parse_config(text: &str) -> Result<ChainConfig> {
    Ok(toml::from_str(text)?)
}
