use crate::constants::{
    CANCEL_POLL_INTERVAL, EMPTY_MERKLE_ROOT, GENESIS_TIMESTAMP, HEADER_PREIMAGE_SIZE, ZERO_HASH,
};
use crate::merkle::merkle_root;
use crate::{pow, sha256, Cancellation, Hash, Transaction};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BlockHeader {
    pub index: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    #[serde(with = "hex::serde")]
    pub previous_hash: Hash,
    #[serde(with = "hex::serde")]
    pub merkle_root: Hash,
    pub nonce: u64,
}

impl BlockHeader {
    pub fn new(index: u64, timestamp: u64, previous_hash: Hash, merkle_root: Hash) -> Self {
        Self {
            index,
            timestamp,
            previous_hash,
            merkle_root,
            nonce: 0,
        }
    }

    /// `index LE || timestamp LE || previous_hash || merkle_root || nonce LE`
    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_PREIMAGE_SIZE);
        bytes.extend_from_slice(&self.index.to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&self.previous_hash);
        bytes.extend_from_slice(&self.merkle_root);
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes
    }

    pub fn hash(&self) -> Hash {
        sha256(&self.hash_bytes())
    }
}

/// Result of a proof-of-work search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MineOutcome {
    Mined { nonce: u64, attempts: u64 },
    Cancelled { attempts: u64 },
}

impl MineOutcome {
    pub fn is_mined(&self) -> bool {
        matches!(self, MineOutcome::Mined { .. })
    }

    pub fn attempts(&self) -> u64 {
        match *self {
            MineOutcome::Mined { attempts, .. } | MineOutcome::Cancelled { attempts } => attempts,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Vec<Transaction>,
    #[serde(with = "hex::serde")]
    pub hash: Hash,
}

impl Block {
    /// An unmined block: merkle root and hash computed, nonce at zero.
    pub fn new(index: u64, previous_hash: Hash, txs: Vec<Transaction>, timestamp: u64) -> Self {
        let header = BlockHeader::new(index, timestamp, previous_hash, merkle_root(&txs));
        let hash = header.hash();
        Self { header, txs, hash }
    }

    /// Fixed first block. It is never mined; validation only checks its hash
    /// and merkle root.
    pub fn genesis() -> Self {
        let header = BlockHeader::new(0, GENESIS_TIMESTAMP, ZERO_HASH, EMPTY_MERKLE_ROOT);
        let hash = header.hash();
        Self {
            header,
            txs: vec![],
            hash,
        }
    }

    /// Hash derived from the current header. Mining and validation both go
    /// through here.
    pub fn recompute_hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn merkle_root_matches(&self) -> bool {
        merkle_root(&self.txs) == self.header.merkle_root
    }

    pub fn is_mined(&self, difficulty: usize) -> bool {
        pow::meets_difficulty(&self.hash, difficulty)
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Increment the nonce until the hash has `difficulty` leading zero hex
    /// digits or `cancel` trips. A cancelled block keeps whatever nonce it
    /// reached and should be discarded.
    pub fn mine(&mut self, difficulty: usize, cancel: &Cancellation) -> MineOutcome {
        let mut attempts = 0u64;
        while !pow::meets_difficulty(&self.hash, difficulty) {
            if attempts % CANCEL_POLL_INTERVAL == 0 && cancel.is_cancelled() {
                return MineOutcome::Cancelled { attempts };
            }
            self.header.nonce = self.header.nonce.wrapping_add(1);
            self.hash = self.recompute_hash();
            attempts += 1;
        }
        MineOutcome::Mined {
            nonce: self.header.nonce,
            attempts,
        }
    }

    pub fn into_transactions(self) -> Vec<Transaction> {
        self.txs
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(GENESIS_TIMESTAMP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Amount, TransactionKind};
    use std::time::Duration;

    fn sample_txs() -> Vec<Transaction> {
        vec![
            Transaction::new("Alice", "Bob", Amount::from_minor(1000), TransactionKind::Transfer)
                .unwrap(),
            Transaction::new("Bob", "Charlie", Amount::from_minor(500), TransactionKind::Transfer)
                .unwrap(),
        ]
    }

    fn fixed_block() -> Block {
        Block::new(1, ZERO_HASH, sample_txs(), 1_600_000_200_000)
    }

    #[test]
    fn block_header_hash_bytes_layout() {
        let mut header = BlockHeader::new(1, 77, [0u8; 32], [1u8; 32]);
        header.nonce = 42;
        let bytes = header.hash_bytes();
        assert_eq!(bytes.len(), HEADER_PREIMAGE_SIZE);
        assert_eq!(&bytes[0..8], &1u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &77u64.to_le_bytes());
        assert_eq!(&bytes[16..48], &[0u8; 32]);
        assert_eq!(&bytes[48..80], &[1u8; 32]);
        assert_eq!(&bytes[80..88], &42u64.to_le_bytes());
    }

    #[test]
    fn new_block_is_sealed_but_unmined() {
        let block = fixed_block();
        assert_eq!(block.header.nonce, 0);
        assert_eq!(block.header.merkle_root, merkle_root(&block.txs));
        assert_eq!(block.hash, block.recompute_hash());
        assert!(block.merkle_root_matches());
    }

    #[test]
    fn block_hash_known_vector() {
        let block = fixed_block();
        let expected_hex = "dfae58925689ece98da16fc25eeb6c0781c6a8d3e897b2105e990a4687fdf000";
        assert_eq!(block.hash_hex(), expected_hex);
    }

    #[test]
    fn block_hash_changes_with_nonce() {
        let mut block = fixed_block();
        let before = block.recompute_hash();
        block.header.nonce += 1;
        assert_ne!(before, block.recompute_hash());
    }

    #[test]
    fn genesis_block_is_fixed() {
        let genesis = Block::genesis();
        assert_eq!(genesis.header.index, 0);
        assert_eq!(genesis.header.previous_hash, ZERO_HASH);
        assert_eq!(genesis.header.merkle_root, EMPTY_MERKLE_ROOT);
        assert!(genesis.txs.is_empty());
        assert!(genesis.merkle_root_matches());
        assert_eq!(genesis, Block::genesis());
    }

    #[test]
    fn mine_block_example() {
        let mut block = fixed_block();
        let outcome = block.mine(3, &Cancellation::new());
        let MineOutcome::Mined { nonce, attempts } = outcome else {
            panic!("mining without a deadline cannot be cancelled");
        };
        assert_eq!(block.header.nonce, nonce);
        assert_eq!(attempts, nonce);
        assert!(block.hash_hex().starts_with("000"));
        assert!(block.is_mined(3));
        assert_eq!(block.hash, block.recompute_hash());
    }

    #[test]
    fn mining_is_deterministic_for_fixed_fields() {
        let mut a = fixed_block();
        let mut b = fixed_block();
        a.mine(2, &Cancellation::new());
        b.mine(2, &Cancellation::new());
        assert_eq!(a, b);
    }

    #[test]
    fn zero_difficulty_is_mined_immediately() {
        let mut block = fixed_block();
        let outcome = block.mine(0, &Cancellation::new());
        assert_eq!(outcome, MineOutcome::Mined { nonce: 0, attempts: 0 });
    }

    #[test]
    fn cancelled_before_start_does_no_work() {
        let mut block = fixed_block();
        let cancel = Cancellation::new();
        cancel.cancel();
        let outcome = block.mine(64, &cancel);
        assert_eq!(outcome, MineOutcome::Cancelled { attempts: 0 });
        assert!(!outcome.is_mined());
    }

    #[test]
    fn impossible_difficulty_stops_at_deadline() {
        let mut block = fixed_block();
        let cancel = Cancellation::with_deadline(Duration::from_millis(50));
        let outcome = block.mine(64, &cancel);
        assert!(!outcome.is_mined());
        assert!(outcome.attempts() > 0);
    }

    #[test]
    fn block_serializes_hashes_as_hex() {
        let block = fixed_block();
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["hash"], block.hash_hex());
        assert_eq!(json["header"]["previous_hash"], hex::encode(ZERO_HASH));
        assert_eq!(json["txs"][0]["kind"], "transfer");
        assert_eq!(json["txs"][0]["amount"], 1000);
    }
}
