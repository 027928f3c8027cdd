pub mod block;
pub mod cancel;
pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod merkle;
pub mod mine;
pub mod pow;
pub mod transaction;

pub use block::{Block, BlockHeader, MineOutcome};
pub use cancel::Cancellation;
pub use chain::Blockchain;
pub use config::{ChainConfig, MiningStrategy};
pub use error::{LedgerError, Result, ValidationCheck, ValidationError};
pub use merkle::{merkle_root, MerkleTree};
pub use transaction::{Amount, Transaction, TransactionKind};

use sha2::{Digest, Sha256};

pub type Hash = [u8; 32];

pub(crate) fn sha256(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

pub(crate) fn sha256_pair(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}
