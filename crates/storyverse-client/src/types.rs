//! Wire types for the Storyverse API.

use serde::{Deserialize, Serialize};

/// Coin summary as reported by `GET /api/coins/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinSummary {
    /// Current balance.
    pub available: i64,
    /// Coins spent on chapter unlocks.
    pub used: i64,
    /// Coins ever credited.
    pub earned: i64,
}

/// One ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: String,
    /// The user whose balance changed.
    pub user_id: String,
    /// Signed coin amount.
    pub coins: i64,
    /// Transaction type ("earn", "redeem", "adjust").
    pub kind: String,
    /// Human-readable reason.
    pub reason: String,
    /// The reward rule that produced this transaction, if any.
    pub rule_key: Option<String>,
    /// For reversals, the refunded transaction id.
    pub refund_of: Option<String>,
    /// Balance after this transaction.
    pub balance_after: i64,
    /// Timestamp (RFC 3339).
    pub created_at: String,
}

/// A page of ledger entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionPage {
    /// Transactions (newest first).
    pub transactions: Vec<Transaction>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// A story run as reported by the run endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    /// Run ID.
    pub run_id: String,
    /// Current chapter position.
    pub step_no: u8,
    /// Genre slugs chosen so far.
    pub path: Vec<String>,
    /// Whether the journey is finished.
    pub completed: bool,
    /// Started timestamp (RFC 3339).
    pub created_at: String,
}

/// The current node of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentNode {
    /// Run ID.
    pub run_id: String,
    /// Current chapter position.
    pub step_no: u8,
    /// The genre chosen at the current step, if any.
    pub genre: Option<String>,
    /// Whether the journey is finished.
    pub completed: bool,
    /// Whether the current chapter is free for everyone.
    pub chapter_is_free: bool,
}

/// Result of rating a chapter node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateOutcome {
    /// Whether the rating was stored.
    pub ok: bool,
    /// Coins granted by the rating reward rule.
    pub coins_awarded: i64,
}

/// Result of a successful chapter unlock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockOutcome {
    /// Whether the unlock succeeded.
    pub ok: bool,
    /// The unlocked chapter.
    pub chapter_number: u8,
    /// Balance after the debit.
    pub balance: i64,
    /// The redeem transaction that paid for the unlock.
    pub transaction_id: String,
}

/// Rate request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RateRequest {
    pub node_id: String,
    pub rating: u8,
}

/// Unlock request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UnlockRequest {
    pub chapter_number: u8,
}

/// Choose request body.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChooseRequest {
    pub genre: String,
}

/// Generic error envelope returned by most failing endpoints.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    pub message: String,
}
