use crate::constants::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use crate::error::{LedgerError, Result};
use crate::Cancellation;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningStrategy {
    /// Single thread, nonces tried in order from zero.
    #[default]
    Sequential,
    /// Rayon search across all cores; first hit wins.
    Parallel,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Required leading zero hex digits in a block hash.
    pub difficulty: usize,
    /// Cap on transactions per block; `None` mines the whole pool.
    pub max_batch_size: Option<usize>,
    pub mining_timeout_ms: Option<u64>,
    pub strategy: MiningStrategy,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_batch_size: None,
            mining_timeout_ms: None,
            strategy: MiningStrategy::Sequential,
        }
    }
}

impl ChainConfig {
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn mining_timeout(&self) -> Option<Duration> {
        self.mining_timeout_ms.map(Duration::from_millis)
    }

    /// Fresh cancellation carrying this config's mining deadline.
    pub fn cancellation(&self) -> Cancellation {
        Cancellation::with_optional_deadline(self.mining_timeout())
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::Config(format!(
                "difficulty {} exceeds the {MAX_DIFFICULTY} hex digits of a hash",
                self.difficulty
            )));
        }
        if self.max_batch_size == Some(0) {
            return Err(LedgerError::Config("max_batch_size must be at least 1".into()));
        }
        Ok(())
    }
}
