//! Wallet API endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};
use engine::Receipt;
use serde::{Deserialize, Serialize};

use crate::{ServerError, server::ServerState};

static IDEMPOTENCY_KEY_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("idempotency-key");

/// `TypedHeader` for the client-supplied idempotency key.
///
/// Every movement request must carry an "idempotency-key" entry in the
/// header; a repeated key replays the recorded outcome instead of moving
/// funds twice.
#[derive(Debug)]
pub struct IdempotencyKey(String);

impl Header for IdempotencyKey {
    fn name() -> &'static axum::http::HeaderName {
        &IDEMPOTENCY_KEY_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        if value.trim().is_empty() {
            return Err(AxumError::invalid());
        }

        Ok(IdempotencyKey(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode idempotency-key header"),
        }
    }
}

#[derive(Deserialize)]
pub struct MovementNew {
    /// Decimal string, parsed as a positive integer amount of minor units.
    pub amount: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementCreated {
    pub success: bool,
    pub transaction_id: String,
    pub new_balance: String,
    pub replayed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceGet {
    pub wallet_id: String,
    pub balance: String,
}

impl From<Receipt> for MovementCreated {
    fn from(receipt: Receipt) -> Self {
        Self {
            success: true,
            transaction_id: receipt.transaction_id.to_string(),
            new_balance: receipt.new_balance.to_string(),
            replayed: receipt.replayed,
        }
    }
}

fn parse_amount(raw: &str) -> Result<i64, ServerError> {
    let amount: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ServerError::Generic(format!("amount '{raw}' is not an integer")))?;
    if amount <= 0 {
        return Err(ServerError::Generic(
            "amount must be a positive integer".to_string(),
        ));
    }

    Ok(amount)
}

pub async fn spend(
    State(state): State<ServerState>,
    Path(wallet_id): Path<String>,
    TypedHeader(key): TypedHeader<IdempotencyKey>,
    Json(payload): Json<MovementNew>,
) -> Result<Json<MovementCreated>, ServerError> {
    let amount = parse_amount(&payload.amount)?;
    let receipt = state.engine.spend(&wallet_id, amount, &key.0).await?;

    Ok(Json(receipt.into()))
}

pub async fn top_up(
    State(state): State<ServerState>,
    Path(wallet_id): Path<String>,
    TypedHeader(key): TypedHeader<IdempotencyKey>,
    Json(payload): Json<MovementNew>,
) -> Result<Json<MovementCreated>, ServerError> {
    let amount = parse_amount(&payload.amount)?;
    let receipt = state.engine.top_up(&wallet_id, amount, &key.0).await?;

    Ok(Json(receipt.into()))
}

pub async fn bonus(
    State(state): State<ServerState>,
    Path(wallet_id): Path<String>,
    TypedHeader(key): TypedHeader<IdempotencyKey>,
    Json(payload): Json<MovementNew>,
) -> Result<Json<MovementCreated>, ServerError> {
    let amount = parse_amount(&payload.amount)?;
    let receipt = state.engine.bonus(&wallet_id, amount, &key.0).await?;

    Ok(Json(receipt.into()))
}

pub async fn balance(
    State(state): State<ServerState>,
    Path(wallet_id): Path<String>,
) -> Result<Json<BalanceGet>, ServerError> {
    let view = state.engine.balance(&wallet_id).await?;

    Ok(Json(BalanceGet {
        wallet_id: view.wallet_id.to_string(),
        balance: view.balance.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_accepts_positive_integers() {
        assert_eq!(parse_amount("30").unwrap(), 30);
        assert_eq!(parse_amount(" 7 ").unwrap(), 7);
    }

    #[test]
    fn parse_amount_rejects_zero_and_negatives() {
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-5").is_err());
    }

    #[test]
    fn parse_amount_rejects_fractions_and_garbage() {
        assert!(parse_amount("1.5").is_err());
        assert!(parse_amount("ten").is_err());
        assert!(parse_amount("").is_err());
    }
}
