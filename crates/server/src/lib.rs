use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::LedgerError;
use serde::Serialize;

pub use server::{ServerState, router, run_with_listener};

mod server;
mod wallets;

#[derive(Debug)]
pub enum ServerError {
    Ledger(LedgerError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_ledger_error(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
        LedgerError::WalletNotFound(_) | LedgerError::TreasuryNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::InsufficientBalance(_) => StatusCode::CONFLICT,
        LedgerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_ledger_error(err: LedgerError) -> String {
    match err {
        LedgerError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Ledger(err) => {
                (status_for_ledger_error(&err), message_for_ledger_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<LedgerError> for ServerError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}
