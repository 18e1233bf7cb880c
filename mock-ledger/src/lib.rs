pub mod pda;
pub mod program;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub use pda::Pubkey;
pub use program::{Account, Instruction, Ledger};

/// Program id of the deployed todo program.
pub const PROGRAM_ID: &str = "C9vSD5Fhc6Jm1BXeHZzYScpLqGrXneDVQ79GtP8sFW6p";

pub type Db = Arc<RwLock<Ledger>>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyedAccount {
    pub address: Pubkey,
    pub account: Account,
}

#[derive(Deserialize)]
pub struct AccountQuery {
    #[serde(rename = "programId")]
    pub program_id: Option<Pubkey>,
    pub authority: Option<Pubkey>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Submitted {
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Rejected {
    pub error: String,
}

pub fn app() -> Router {
    let program_id = PROGRAM_ID.parse().unwrap_or(Pubkey::SYSTEM_PROGRAM);
    app_with_program(program_id)
}

pub fn app_with_program(program_id: Pubkey) -> Router {
    let db: Db = Arc::new(RwLock::new(Ledger::new(program_id)));
    Router::new()
        .route("/accounts", get(query_accounts))
        .route("/accounts/{address}", get(get_account))
        .route("/instructions", post(submit_instruction))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn get_account(
    State(db): State<Db>,
    Path(address): Path<String>,
) -> Result<Json<Account>, StatusCode> {
    let address: Pubkey = address.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    let ledger = db.read().await;
    ledger.accounts.get(&address).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn query_accounts(
    State(db): State<Db>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<Vec<KeyedAccount>>, StatusCode> {
    let ledger = db.read().await;
    if query.program_id.is_some_and(|id| id != ledger.program_id) {
        return Ok(Json(Vec::new()));
    }
    let accounts = ledger
        .accounts
        .iter()
        .filter(|(_, account)| query.authority.map_or(true, |who| account.authority() == who))
        .map(|(address, account)| KeyedAccount {
            address: *address,
            account: account.clone(),
        })
        .collect();
    Ok(Json(accounts))
}

async fn submit_instruction(
    State(db): State<Db>,
    Json(ix): Json<Instruction>,
) -> Result<Json<Submitted>, (StatusCode, Json<Rejected>)> {
    let mut ledger = db.write().await;
    match ledger.execute(&ix) {
        Ok(()) => {
            let signature = Uuid::new_v4().simple().to_string();
            info!(kind = ?ix.kind, %signature, "instruction executed");
            Ok(Json(Submitted { signature }))
        }
        Err(err) => {
            warn!(kind = ?ix.kind, error = %err, "instruction rejected");
            Err((
                StatusCode::BAD_REQUEST,
                Json(Rejected {
                    error: err.to_string(),
                }),
            ))
        }
    }
}
