use ledger_core::mine::mine_with_strategy;
use ledger_core::{
    Block, Blockchain, Cancellation, LedgerError, MineOutcome, Transaction, ValidationError,
};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("mining worker failed: {0}")]
    Worker(String),
}

/// One in-memory chain shared by all request handlers.
///
/// Readers take the chain lock briefly. Mining holds it only to take a
/// candidate and to append the result; the nonce search itself runs on a
/// blocking worker, so transactions keep flowing into the pool meanwhile.
/// At most one mining job runs at a time; later ones queue behind it.
#[derive(Clone)]
pub struct LedgerService {
    chain: Arc<RwLock<Blockchain>>,
    miner: Arc<tokio::sync::Mutex<()>>,
    jobs: Arc<Mutex<Vec<Cancellation>>>,
}

impl LedgerService {
    pub fn new(chain: Blockchain) -> Self {
        Self {
            chain: Arc::new(RwLock::new(chain)),
            miner: Arc::new(tokio::sync::Mutex::new(())),
            jobs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Blockchain> {
        self.chain.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Blockchain> {
        self.chain.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a transaction and returns the new pool size.
    pub fn submit(&self, tx: Transaction) -> Result<usize, ServiceError> {
        let mut chain = self.write();
        chain.add_transaction(tx)?;
        Ok(chain.pending_len())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.read().validate()
    }

    /// Mining jobs that are running or queued.
    pub fn mining_jobs(&self) -> usize {
        self.job_list().len()
    }

    /// Trips every running or queued mining job. Returns whether there was
    /// any.
    pub fn cancel_mining(&self) -> bool {
        let jobs: Vec<Cancellation> = self.job_list().drain(..).collect();
        for job in &jobs {
            job.cancel();
        }
        !jobs.is_empty()
    }

    /// Mines the pending pool into one block.
    ///
    /// The job is cancellable from the moment it is requested, and runs
    /// detached, so a caller that goes away mid-search does not strand the
    /// candidate's transactions.
    pub async fn mine(&self) -> Result<Option<Block>, ServiceError> {
        let stop = Cancellation::new();
        self.job_list().push(stop.clone());
        let service = self.clone();
        tokio::spawn(async move {
            let result = service.run_mining_job(&stop).await;
            service
                .job_list()
                .retain(|job| !job.shares_flag_with(&stop));
            result
        })
        .await
        .map_err(|e| ServiceError::Worker(e.to_string()))?
    }

    async fn run_mining_job(&self, stop: &Cancellation) -> Result<Option<Block>, ServiceError> {
        let _guard = self.miner.lock().await;
        if stop.is_cancelled() {
            info!("mining job cancelled before it started");
            return Err(LedgerError::MiningCancelled { attempts: 0 }.into());
        }

        let (candidate, config) = {
            let mut chain = self.write();
            match chain.take_candidate() {
                Some(candidate) => (candidate, chain.config().clone()),
                None => return Ok(None),
            }
        };
        let backup = candidate.txs.clone();
        let cancel = stop.deadline_after(config.mining_timeout());

        let worker = tokio::task::spawn_blocking(move || {
            let mut block = candidate;
            let (difficulty, strategy) = (config.difficulty, config.strategy);
            let outcome = mine_with_strategy(&mut block, difficulty, strategy, &cancel);
            (block, outcome)
        });
        let joined = worker.await;

        let mut chain = self.write();
        let (block, outcome) = match joined {
            Ok(done) => done,
            Err(e) => {
                error!("mining worker died: {e}");
                chain.return_to_pool(backup);
                return Err(ServiceError::Worker(e.to_string()));
            }
        };
        match outcome {
            MineOutcome::Mined { attempts, .. } => {
                let block = chain.append_mined(block)?.clone();
                info!(
                    index = block.header.index,
                    attempts,
                    pending = chain.pending_len(),
                    "mining job finished"
                );
                Ok(Some(block))
            }
            MineOutcome::Cancelled { attempts } => {
                warn!(attempts, "mining job cancelled, transactions returned to the pool");
                chain.return_to_pool(block.into_transactions());
                Err(LedgerError::MiningCancelled { attempts }.into())
            }
        }
    }

    fn job_list(&self) -> MutexGuard<'_, Vec<Cancellation>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
