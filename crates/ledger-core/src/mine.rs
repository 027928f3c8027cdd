use crate::constants::CANCEL_POLL_INTERVAL;
use crate::pow::meets_difficulty;
use crate::{Block, Cancellation, MineOutcome, MiningStrategy};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Mines `block` in place with the configured strategy.
pub fn mine_with_strategy(
    block: &mut Block,
    difficulty: usize,
    strategy: MiningStrategy,
    cancel: &Cancellation,
) -> MineOutcome {
    debug!(
        index = block.header.index,
        txs = block.txs.len(),
        difficulty,
        ?strategy,
        "mining block"
    );
    let outcome = match strategy {
        MiningStrategy::Sequential => block.mine(difficulty, cancel),
        MiningStrategy::Parallel => mine_block_parallel(block, difficulty, cancel),
    };
    if let MineOutcome::Mined { nonce, attempts } = outcome {
        info!(
            "Mined block {} with nonce {} after {} attempts: {}",
            block.header.index,
            nonce,
            attempts,
            block.hash_hex()
        );
    }
    outcome
}

/// Searches nonces in parallel until the header hash has `difficulty` leading
/// zero hex digits. Any satisfying nonce may win, not necessarily the lowest.
/// On cancellation the block is left untouched.
pub fn mine_block_parallel(
    block: &mut Block,
    difficulty: usize,
    cancel: &Cancellation,
) -> MineOutcome {
    if block.is_mined(difficulty) {
        return MineOutcome::Mined {
            nonce: block.header.nonce,
            attempts: 0,
        };
    }

    // Only the nonce varies per attempt.
    let base_header = block.header;
    let attempts = AtomicU64::new(0);

    // Returning true on cancellation ends the search the same way a hit does;
    // the winner is re-checked below.
    let found = (0u64..u64::MAX).into_par_iter().find_any(|nonce| {
        let n = attempts.fetch_add(1, Ordering::Relaxed);
        if n % CANCEL_POLL_INTERVAL == 0 && cancel.is_cancelled() {
            return true;
        }
        let mut h = base_header;
        h.nonce = *nonce;
        meets_difficulty(&h.hash(), difficulty)
    });
    let attempts = attempts.into_inner();

    let Some(nonce) = found else {
        return MineOutcome::Cancelled { attempts };
    };
    let mut header = base_header;
    header.nonce = nonce;
    let hash = header.hash();
    if !meets_difficulty(&hash, difficulty) {
        return MineOutcome::Cancelled { attempts };
    }
    block.header = header;
    block.hash = hash;
    MineOutcome::Mined { nonce, attempts }
}
