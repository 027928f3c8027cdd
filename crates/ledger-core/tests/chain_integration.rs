use ledger_core::{
    merkle_root, Amount, Blockchain, Cancellation, ChainConfig, LedgerError, MiningStrategy,
    Transaction, TransactionKind,
};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::{Arc, Mutex};
use std::thread;

fn random_transactions(n: usize) -> Vec<Transaction> {
    let mut rng = rand::thread_rng();
    let kinds = [
        TransactionKind::Deposit,
        TransactionKind::Withdrawal,
        TransactionKind::Transfer,
    ];
    (0..n)
        .map(|i| {
            Transaction::new(
                format!("user-{i}"),
                format!("user-{}", i + 1),
                Amount::from_minor(rng.gen_range(1..1_000_000)),
                *kinds.choose(&mut rng).unwrap(),
            )
            .unwrap()
        })
        .collect()
}

#[test]
fn end_to_end_deposit_is_mined_and_valid() -> anyhow::Result<()> {
    let mut chain = Blockchain::with_difficulty(2)?;
    assert!(chain.is_chain_valid());

    chain.add_transaction(Transaction::parse("Alice", "Bob", "50", "deposit")?)?;
    assert_eq!(chain.pending_len(), 1);

    let block = chain
        .mine_pending_transactions()?
        .expect("one pending transaction produces a block");
    assert_eq!(block.header.index, 1);
    assert!(block.hash_hex().starts_with("00"));
    assert_eq!(block.hash, block.recompute_hash());

    assert_eq!(chain.len(), 2);
    assert_eq!(chain.pending_len(), 0);
    assert!(chain.is_chain_valid());
    Ok(())
}

#[test]
fn invalid_ingestion_leaves_pool_untouched() {
    let mut chain = Blockchain::new();
    for (amount, kind) in [("0", "deposit"), ("-3", "deposit"), ("10", "loan")] {
        let err = Transaction::parse("Alice", "Bob", amount, kind).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransaction(_)));
    }
    assert_eq!(chain.pending_len(), 0);
    assert!(chain.mine_pending_transactions().unwrap().is_none());
}

#[test]
fn merkle_root_is_deterministic_for_random_batches() {
    let mut rng = rand::thread_rng();
    for n in [1, 2, 3, 7, 64] {
        let txs = random_transactions(n);
        assert_eq!(merkle_root(&txs), merkle_root(&txs.clone()));
        if n > 1 {
            let mut shuffled = txs.clone();
            while shuffled == txs {
                shuffled.shuffle(&mut rng);
            }
            assert_ne!(merkle_root(&txs), merkle_root(&shuffled));
        }
    }
}

#[test]
fn every_mined_block_meets_difficulty_and_links() -> anyhow::Result<()> {
    let mut chain = Blockchain::with_config(ChainConfig {
        max_batch_size: Some(4),
        ..ChainConfig::with_difficulty(2)
    })?;
    for tx in random_transactions(10) {
        chain.add_transaction(tx)?;
    }
    while chain.mine_pending_transactions()?.is_some() {}

    assert_eq!(chain.len(), 4);
    for pair in chain.blocks().windows(2) {
        assert_eq!(pair[1].header.previous_hash, pair[0].hash);
        assert!(pair[1].is_mined(2));
        assert_eq!(pair[1].hash, pair[1].recompute_hash());
    }
    assert!(chain.validate().is_ok());
    Ok(())
}

#[test]
fn worker_cancellation_keeps_chain_and_pool() {
    let chain = Arc::new(Mutex::new(Blockchain::with_difficulty(64).unwrap()));
    chain
        .lock()
        .unwrap()
        .add_transaction(Transaction::parse("Alice", "Bob", "1.25", "transfer").unwrap())
        .unwrap();

    let mut candidate = chain.lock().unwrap().take_candidate().unwrap();
    let cancel = Cancellation::new();
    let worker_cancel = cancel.clone();
    let worker = thread::spawn(move || {
        let outcome = candidate.mine(64, &worker_cancel);
        (candidate, outcome)
    });
    cancel.cancel();
    let (candidate, outcome) = worker.join().unwrap();
    assert!(!outcome.is_mined());

    let mut chain = chain.lock().unwrap();
    chain.return_to_pool(candidate.into_transactions());
    assert_eq!(chain.len(), 1);
    assert_eq!(chain.pending_len(), 1);
    assert_eq!(chain.pending()[0].amount(), Amount::from_minor(125));
    assert!(chain.is_chain_valid());
}

#[test]
fn parallel_chain_serializes_to_hex_json() -> anyhow::Result<()> {
    let mut chain = Blockchain::with_config(ChainConfig {
        strategy: MiningStrategy::Parallel,
        ..ChainConfig::with_difficulty(1)
    })?;
    chain.add_transaction(Transaction::parse("SYSTEM", "+254712345678", "100", "DEPOSIT")?)?;
    chain.mine_pending_transactions()?;

    let json = serde_json::to_value(chain.blocks())?;
    assert_eq!(json.as_array().map(Vec::len), Some(2));
    assert_eq!(json[1]["header"]["previous_hash"], chain.blocks()[0].hash_hex());
    assert_eq!(json[1]["txs"][0]["kind"], "deposit");
    assert_eq!(json[1]["txs"][0]["amount"], 10_000);
    Ok(())
}
