use crate::constants::{BLOCKS_PER_BATCH, MAX_BLOCKS_PER_REQUEST};
use crate::service::{LedgerService, ServiceError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{Block, LedgerError, Transaction, ValidationCheck};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

pub fn router(service: LedgerService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/tx", post(submit_tx))
        .route("/mine", post(mine))
        .route("/mine/cancel", post(cancel_mining))
        .route("/chain", get(chain))
        .route("/chain/head", get(head))
        .route("/chain/valid", get(valid))
        .route("/pending", get(pending))
        .route("/history/{account}", get(history))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

/// Amount as sent by clients: `"50.25"` or `50.25`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountIn {
    Text(String),
    Number(serde_json::Number),
}

impl AmountIn {
    fn as_text(&self) -> String {
        match self {
            AmountIn::Text(s) => s.clone(),
            AmountIn::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct TxIn {
    sender: String,
    receiver: String,
    amount: AmountIn,
    kind: String,
}

#[derive(Serialize)]
struct TxAccepted {
    accepted: bool,
    pending: usize,
    tx: Transaction,
}

#[derive(Serialize)]
struct MineResult {
    mined: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    block: Option<Block>,
}

#[derive(Serialize)]
struct Cancelled {
    cancelled: bool,
}

#[derive(Deserialize)]
pub struct Page {
    from: Option<usize>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ChainPage {
    length: usize,
    from: usize,
    blocks: Vec<Block>,
}

#[derive(Serialize)]
struct Head {
    height: u64,
    hash: String,
    difficulty: usize,
}

#[derive(Serialize)]
struct Verdict {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<VerdictError>,
}

#[derive(Serialize)]
struct VerdictError {
    index: usize,
    check: ValidationCheck,
    message: String,
}

#[derive(Serialize)]
struct Pending {
    count: usize,
    txs: Vec<Transaction>,
}

#[derive(Serialize)]
struct HistoryEntry {
    block: u64,
    tx: Transaction,
}

#[derive(Serialize)]
struct History {
    account: String,
    entries: Vec<HistoryEntry>,
}

pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ServiceError::Ledger(LedgerError::InvalidTransaction(_)) => StatusCode::BAD_REQUEST,
            ServiceError::Ledger(LedgerError::MiningCancelled { .. }) => {
                StatusCode::REQUEST_TIMEOUT
            }
            ServiceError::Ledger(LedgerError::RejectedBlock(_)) => StatusCode::CONFLICT,
            ServiceError::Ledger(LedgerError::Config(_)) | ServiceError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn submit_tx(
    State(service): State<LedgerService>,
    Json(tx): Json<TxIn>,
) -> Result<(StatusCode, Json<TxAccepted>), ApiError> {
    let tx = Transaction::parse(&tx.sender, &tx.receiver, &tx.amount.as_text(), &tx.kind)?;
    let pending = service.submit(tx.clone())?;
    Ok((
        StatusCode::CREATED,
        Json(TxAccepted {
            accepted: true,
            pending,
            tx,
        }),
    ))
}

async fn mine(State(service): State<LedgerService>) -> Result<Json<MineResult>, ApiError> {
    let block = service.mine().await?;
    Ok(Json(MineResult {
        mined: block.is_some(),
        block,
    }))
}

async fn cancel_mining(State(service): State<LedgerService>) -> Json<Cancelled> {
    Json(Cancelled {
        cancelled: service.cancel_mining(),
    })
}

async fn chain(State(service): State<LedgerService>, Query(page): Query<Page>) -> Json<ChainPage> {
    let chain = service.read();
    let from = page.from.unwrap_or(0).min(chain.len());
    let limit = page
        .limit
        .unwrap_or(BLOCKS_PER_BATCH)
        .min(MAX_BLOCKS_PER_REQUEST);
    let blocks = chain.blocks()[from..].iter().take(limit).cloned().collect();
    Json(ChainPage {
        length: chain.len(),
        from,
        blocks,
    })
}

async fn head(State(service): State<LedgerService>) -> Json<Head> {
    let chain = service.read();
    let tip = chain.latest_block();
    Json(Head {
        height: tip.header.index,
        hash: tip.hash_hex(),
        difficulty: chain.difficulty(),
    })
}

async fn valid(State(service): State<LedgerService>) -> Json<Verdict> {
    let error = service.validate().err().map(|err| VerdictError {
        index: err.index(),
        check: err.check(),
        message: err.to_string(),
    });
    Json(Verdict {
        valid: error.is_none(),
        error,
    })
}

async fn pending(State(service): State<LedgerService>) -> Json<Pending> {
    let chain = service.read();
    Json(Pending {
        count: chain.pending_len(),
        txs: chain.pending().to_vec(),
    })
}

async fn history(
    State(service): State<LedgerService>,
    Path(account): Path<String>,
) -> Json<History> {
    let chain = service.read();
    let entries = chain
        .history(&account)
        .map(|(block, tx)| HistoryEntry {
            block,
            tx: tx.clone(),
        })
        .collect();
    Json(History { account, entries })
}
