use crate::block::now_millis;
use crate::error::{LedgerError, Result, ValidationError};
use crate::mine::mine_with_strategy;
use crate::{Block, Cancellation, ChainConfig, MineOutcome, Transaction};
use tracing::{debug, info, warn};

/// Append-only chain of blocks plus the pool of transactions waiting to be
/// mined. Block 0 is always the genesis block.
#[derive(Clone, Debug)]
pub struct Blockchain {
    blocks: Vec<Block>,
    pending: Vec<Transaction>,
    config: ChainConfig,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::len_without_is_empty)]
impl Blockchain {
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::genesis()],
            pending: Vec::new(),
            config: ChainConfig::default(),
        }
    }

    pub fn with_config(config: ChainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Restores a chain from existing blocks without checking them. Call
    /// [`Blockchain::validate`] to find out whether they hold together.
    pub fn from_blocks(blocks: Vec<Block>, config: ChainConfig) -> Result<Self> {
        config.validate()?;
        if blocks.is_empty() {
            return Err(LedgerError::RejectedBlock(
                "a chain needs at least a genesis block".into(),
            ));
        }
        Ok(Self {
            blocks,
            pending: Vec::new(),
            config,
        })
    }

    pub fn with_difficulty(difficulty: usize) -> Result<Self> {
        Self::with_config(ChainConfig::with_difficulty(difficulty))
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn latest_block(&self) -> &Block {
        self.blocks.last().expect("chain always holds the genesis block")
    }

    /// Number of blocks, genesis included. Never zero.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn add_transaction(&mut self, tx: Transaction) -> Result<()> {
        tx.validate()?;
        debug!(
            sender = tx.sender(),
            receiver = tx.receiver(),
            amount = %tx.amount(),
            kind = %tx.kind(),
            "transaction queued"
        );
        self.pending.push(tx);
        Ok(())
    }

    /// Moves the oldest pending transactions (up to the batch cap) into a new
    /// unmined block that extends the current tip.
    pub fn take_candidate(&mut self) -> Option<Block> {
        if self.pending.is_empty() {
            return None;
        }
        let take = self
            .config
            .max_batch_size
            .map_or(self.pending.len(), |cap| cap.min(self.pending.len()));
        let txs: Vec<Transaction> = self.pending.drain(..take).collect();
        let tip = self.latest_block();
        Some(Block::new(tip.header.index + 1, tip.hash, txs, now_millis()))
    }

    /// Puts transactions back at the head of the pool, keeping their order.
    pub fn return_to_pool(&mut self, txs: Vec<Transaction>) {
        if !txs.is_empty() {
            debug!(count = txs.len(), "returning transactions to the pool");
            self.pending.splice(0..0, txs);
        }
    }

    /// Appends a mined candidate after re-checking that it extends the tip and
    /// is internally consistent. A rejected block's transactions go back to
    /// the pool.
    pub fn append_mined(&mut self, block: Block) -> Result<&Block> {
        if let Err(reason) = self.check_candidate(&block) {
            warn!(index = block.header.index, "rejected block: {reason}");
            self.return_to_pool(block.into_transactions());
            return Err(LedgerError::RejectedBlock(reason));
        }
        info!(
            index = block.header.index,
            txs = block.txs.len(),
            hash = %block.hash_hex(),
            "block appended"
        );
        self.blocks.push(block);
        Ok(self.latest_block())
    }

    fn check_candidate(&self, block: &Block) -> std::result::Result<(), String> {
        let tip = self.latest_block();
        if block.header.index != tip.header.index + 1 {
            return Err(format!(
                "expected index {}, got {}",
                tip.header.index + 1,
                block.header.index
            ));
        }
        if block.header.previous_hash != tip.hash {
            return Err("previous hash does not match the current tip".into());
        }
        if block.hash != block.recompute_hash() {
            return Err("stored hash does not match its header".into());
        }
        if !block.merkle_root_matches() {
            return Err("merkle root does not match its transactions".into());
        }
        if !block.is_mined(self.config.difficulty) {
            return Err(format!(
                "hash {} does not meet difficulty {}",
                block.hash_hex(),
                self.config.difficulty
            ));
        }
        Ok(())
    }

    /// Mines the whole pending pool (or one batch of it) into a new block,
    /// bounded by the configured mining timeout.
    ///
    /// Returns `Ok(None)` when there is nothing to mine. On timeout the chain
    /// is unchanged and the transactions stay pending.
    pub fn mine_pending_transactions(&mut self) -> Result<Option<&Block>> {
        let cancel = self.config.cancellation();
        self.mine_pending_with(&cancel)
    }

    pub fn mine_pending_with(&mut self, cancel: &Cancellation) -> Result<Option<&Block>> {
        let Some(mut block) = self.take_candidate() else {
            debug!("no pending transactions to mine");
            return Ok(None);
        };
        match mine_with_strategy(
            &mut block,
            self.config.difficulty,
            self.config.strategy,
            cancel,
        ) {
            MineOutcome::Mined { .. } => self.append_mined(block).map(Some),
            MineOutcome::Cancelled { attempts } => {
                warn!(
                    index = block.header.index,
                    attempts, "mining cancelled, block discarded"
                );
                self.return_to_pool(block.into_transactions());
                Err(LedgerError::MiningCancelled { attempts })
            }
        }
    }

    /// Walks every block and reports the first inconsistency.
    ///
    /// Per block, in order: stored hash equals the recomputed header hash,
    /// merkle root equals the root of its transactions, and (from block 1 on)
    /// previous hash equals the preceding block's hash.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        for (index, block) in self.blocks.iter().enumerate() {
            if block.hash != block.recompute_hash() {
                return Err(ValidationError::HashMismatch { index });
            }
            if !block.merkle_root_matches() {
                return Err(ValidationError::MerkleRootMismatch { index });
            }
            if index > 0 && block.header.previous_hash != self.blocks[index - 1].hash {
                return Err(ValidationError::BrokenLink { index });
            }
        }
        Ok(())
    }

    pub fn is_chain_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!(index = err.index(), check = ?err.check(), "tamper detected: {err}");
                false
            }
        }
    }

    /// Confirmed transactions where `account` is sender or receiver, oldest
    /// first, each with the index of its block.
    pub fn history<'a>(
        &'a self,
        account: &'a str,
    ) -> impl Iterator<Item = (u64, &'a Transaction)> + 'a {
        self.blocks.iter().flat_map(move |block| {
            block
                .txs
                .iter()
                .filter(move |tx| tx.involves(account))
                .map(move |tx| (block.header.index, tx))
        })
    }
}
