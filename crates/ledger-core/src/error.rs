use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("mining cancelled after {attempts} attempts")]
    MiningCancelled { attempts: u64 },
    #[error("block rejected: {0}")]
    RejectedBlock(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LedgerError {
    pub(crate) fn invalid_tx(msg: impl Into<String>) -> Self {
        LedgerError::InvalidTransaction(msg.into())
    }
}

/// The three per-block checks run by chain validation, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCheck {
    Hash,
    MerkleRoot,
    Linkage,
}

/// First inconsistency found while walking the chain.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("block {index}: stored hash does not match its header")]
    HashMismatch { index: usize },
    #[error("block {index}: merkle root does not match its transactions")]
    MerkleRootMismatch { index: usize },
    #[error("block {index}: previous hash does not match the preceding block")]
    BrokenLink { index: usize },
}

impl ValidationError {
    pub fn index(&self) -> usize {
        match *self {
            ValidationError::HashMismatch { index }
            | ValidationError::MerkleRootMismatch { index }
            | ValidationError::BrokenLink { index } => index,
        }
    }

    pub fn check(&self) -> ValidationCheck {
        match self {
            ValidationError::HashMismatch { .. } => ValidationCheck::Hash,
            ValidationError::MerkleRootMismatch { .. } => ValidationCheck::MerkleRoot,
            ValidationError::BrokenLink { .. } => ValidationCheck::Linkage,
        }
    }
}
