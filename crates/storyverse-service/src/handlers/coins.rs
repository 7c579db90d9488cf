//! Coin summary, transaction history, adjustment and refund handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use storyverse_core::{CoinSummary, CoinTransaction, TransactionId, UserId};
use storyverse_store::Store;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Coin summary response, recomputed from the transaction log.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// Current balance.
    pub available: i64,
    /// Coins spent on chapter unlocks.
    pub used: i64,
    /// Coins ever credited.
    pub earned: i64,
}

impl From<CoinSummary> for SummaryResponse {
    fn from(summary: CoinSummary) -> Self {
        Self {
            available: summary.available,
            used: summary.used,
            earned: summary.earned,
        }
    }
}

/// Get the current user's coin summary.
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = state.store.coin_summary(&auth.user_id)?;
    Ok(Json(SummaryResponse::from(summary)))
}

/// Transaction list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum number of transactions to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// The user whose balance changed.
    pub user_id: String,
    /// Signed coin amount.
    pub coins: i64,
    /// Transaction type.
    pub kind: String,
    /// Human-readable reason.
    pub reason: String,
    /// The reward rule that produced this transaction, if any.
    pub rule_key: Option<String>,
    /// For reversals, the refunded transaction id.
    pub refund_of: Option<String>,
    /// Balance after this transaction.
    pub balance_after: i64,
    /// Timestamp.
    pub created_at: String,
}

impl From<&CoinTransaction> for TransactionResponse {
    fn from(tx: &CoinTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            user_id: tx.user_id.to_string(),
            coins: tx.coins,
            kind: format!("{:?}", tx.kind).to_lowercase(),
            reason: tx.reason.clone(),
            rule_key: tx.rule_key.clone(),
            refund_of: tx.refund_of.map(|id| id.to_string()),
            balance_after: tx.balance_after,
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// List transactions response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions (newest first).
    pub transactions: Vec<TransactionResponse>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List the current user's transaction history.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    // Verify the user exists
    state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let transactions = state
        .store
        .list_transactions_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = transactions.len() > limit;
    let transactions: Vec<_> = transactions
        .iter()
        .take(limit)
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}

/// Admin summary query parameters.
#[derive(Debug, Deserialize)]
pub struct AdminSummaryQuery {
    /// The user to summarize.
    pub user_id: String,
}

/// Get any user's coin summary (admin).
pub async fn admin_summary(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<AdminSummaryQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let user_id = query
        .user_id
        .parse::<UserId>()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    let summary = state.store.coin_summary(&user_id)?;
    Ok(Json(SummaryResponse::from(summary)))
}

/// Admin ledger search query parameters.
#[derive(Debug, Deserialize)]
pub struct AdminTransactionsQuery {
    /// Case-insensitive substring filter on `reason`.
    pub q: Option<String>,
    /// Restrict to one user.
    pub user_id: Option<String>,
    /// Maximum number of transactions to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

/// Search the ledger across users (admin).
pub async fn admin_transactions(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<AdminTransactionsQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    let user_id = query
        .user_id
        .as_deref()
        .map(str::parse::<UserId>)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    let limit = query.limit.min(100);
    let transactions = state.store.search_transactions(
        user_id.as_ref(),
        query.q.as_deref(),
        limit + 1,
        query.offset,
    )?;

    let has_more = transactions.len() > limit;
    let transactions: Vec<_> = transactions
        .iter()
        .take(limit)
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}

/// Admin adjustment request.
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    /// User whose balance to change.
    pub user_id: String,
    /// Signed coin delta. Non-zero.
    pub delta: i64,
    /// Reason recorded on the transaction.
    pub reason: String,
}

/// Adjustment response.
#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    /// The appended transaction.
    pub transaction: TransactionResponse,
    /// Balance after the adjustment.
    pub balance: i64,
}

/// Apply an administrator balance adjustment.
pub async fn adjust(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Json(body): Json<AdjustRequest>,
) -> Result<Json<AdjustResponse>, ApiError> {
    let user_id = body
        .user_id
        .parse::<UserId>()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    if body.delta == 0 {
        return Err(ApiError::BadRequest("Delta must be non-zero".into()));
    }
    if body.reason.trim().is_empty() {
        return Err(ApiError::BadRequest("Reason is required".into()));
    }

    let tx = state.store.record_adjust(&user_id, body.delta, &body.reason)?;

    tracing::info!(
        user_id = %user_id,
        admin = %admin.0.user_id,
        delta = %body.delta,
        reason = %body.reason,
        new_balance = %tx.balance_after,
        "Balance adjusted"
    );

    Ok(Json(AdjustResponse {
        balance: tx.balance_after,
        transaction: TransactionResponse::from(&tx),
    }))
}

/// Refund request.
#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    /// The transaction to reverse.
    pub transaction_id: String,
}

/// Reverse a transaction (admin).
pub async fn refund(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Json(body): Json<RefundRequest>,
) -> Result<Json<AdjustResponse>, ApiError> {
    let transaction_id = body
        .transaction_id
        .parse::<TransactionId>()
        .map_err(|_| ApiError::BadRequest("Invalid transaction ID".into()))?;

    let tx = state.store.record_refund(&transaction_id)?;

    tracing::info!(
        user_id = %tx.user_id,
        admin = %admin.0.user_id,
        refunded = %transaction_id,
        reversal = %tx.id,
        "Transaction refunded"
    );

    Ok(Json(AdjustResponse {
        balance: tx.balance_after,
        transaction: TransactionResponse::from(&tx),
    }))
}
