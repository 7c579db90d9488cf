//! Coin transaction types for Storyverse.
//!
//! Every coin movement is an immutable `CoinTransaction`. Transactions are
//! never mutated or deleted; a mistake is corrected by appending a reversal
//! transaction that back-references the original.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TransactionId, UserId};

/// Reason string used for chapter unlock debits.
pub const REASON_CHAPTER_UNLOCK: &str = "chapter_unlock";

/// A coin transaction representing one balance change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinTransaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The user whose balance changed.
    pub user_id: UserId,

    /// Signed coin amount. Positive credits the balance, negative debits it.
    /// Never zero.
    pub coins: i64,

    /// Type of transaction.
    pub kind: TransactionType,

    /// Human-readable reason.
    pub reason: String,

    /// Additional metadata (rule context, run/chapter, etc.).
    pub meta: serde_json::Value,

    /// The reward rule that produced this transaction, if any.
    pub rule_key: Option<String>,

    /// For reversal transactions, the id of the transaction being refunded.
    pub refund_of: Option<TransactionId>,

    /// Balance after this transaction was applied.
    pub balance_after: i64,

    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
}

impl CoinTransaction {
    /// Create an earn transaction granted by a reward rule.
    #[must_use]
    pub fn earn(
        user_id: UserId,
        rule_key: &str,
        coins: i64,
        balance_after: i64,
        reason: String,
        meta: serde_json::Value,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            coins: coins.abs(), // Always positive for earns
            kind: TransactionType::Earn,
            reason,
            meta,
            rule_key: Some(rule_key.to_string()),
            refund_of: None,
            balance_after,
            created_at: Utc::now(),
        }
    }

    /// Create a redeem transaction (spending coins).
    #[must_use]
    pub fn redeem(
        user_id: UserId,
        coins: i64,
        balance_after: i64,
        reason: String,
        meta: serde_json::Value,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            coins: -coins.abs(), // Always negative for redeems
            kind: TransactionType::Redeem,
            reason,
            meta,
            rule_key: None,
            refund_of: None,
            balance_after,
            created_at: Utc::now(),
        }
    }

    /// Create an administrator adjustment transaction. `coins` keeps the
    /// sign the administrator supplied.
    #[must_use]
    pub fn adjust(user_id: UserId, coins: i64, balance_after: i64, reason: String) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            coins,
            kind: TransactionType::Adjust,
            reason,
            meta: serde_json::Value::Null,
            rule_key: None,
            refund_of: None,
            balance_after,
            created_at: Utc::now(),
        }
    }

    /// Create the reversal of an existing transaction: inverted amount,
    /// back-reference to the original. The original stays untouched.
    #[must_use]
    pub fn reversal(original: &Self, balance_after: i64) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id: original.user_id,
            coins: -original.coins,
            kind: TransactionType::Adjust,
            reason: format!("refund of {}", original.id),
            meta: serde_json::json!({ "refunded_reason": original.reason }),
            rule_key: original.rule_key.clone(),
            refund_of: Some(original.id),
            balance_after,
            created_at: Utc::now(),
        }
    }
}

/// Type of coin transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Coins granted by a reward rule.
    Earn,

    /// Coins spent (chapter unlocks).
    Redeem,

    /// Administrator adjustment or refund reversal.
    Adjust,
}

/// Aggregates derived from a user's transaction log.
///
/// These are recomputed from the log rather than read from the cached
/// balance, so the log stays the source of truth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinSummary {
    /// Signed sum of all transactions.
    pub available: i64,

    /// Sum of absolute values of negative redeem transactions.
    pub used: i64,

    /// Sum of all positive transaction amounts.
    pub earned: i64,
}

impl CoinSummary {
    /// Fold a transaction log into a summary.
    #[must_use]
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a CoinTransaction>,
    {
        let mut summary = Self::default();
        for tx in transactions {
            summary.available += tx.coins;
            if tx.coins > 0 {
                summary.earned += tx.coins;
            }
            if tx.kind == TransactionType::Redeem && tx.coins < 0 {
                summary.used += -tx.coins;
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earn_is_always_positive() {
        let user_id = UserId::generate();
        let tx = CoinTransaction::earn(
            user_id,
            "rating_reward",
            2,
            2,
            "Rated a chapter".into(),
            serde_json::json!({}),
        );

        assert_eq!(tx.coins, 2);
        assert_eq!(tx.kind, TransactionType::Earn);
        assert_eq!(tx.rule_key.as_deref(), Some("rating_reward"));
    }

    #[test]
    fn redeem_is_always_negative() {
        let user_id = UserId::generate();
        let tx = CoinTransaction::redeem(
            user_id,
            100,
            50,
            REASON_CHAPTER_UNLOCK.into(),
            serde_json::json!({"chapter": 3}),
        );

        assert_eq!(tx.coins, -100);
        assert_eq!(tx.kind, TransactionType::Redeem);
        assert_eq!(tx.balance_after, 50);
    }

    #[test]
    fn adjust_keeps_sign() {
        let user_id = UserId::generate();
        let up = CoinTransaction::adjust(user_id, 25, 25, "promo".into());
        let down = CoinTransaction::adjust(user_id, -10, 15, "correction".into());

        assert_eq!(up.coins, 25);
        assert_eq!(down.coins, -10);
    }

    #[test]
    fn reversal_inverts_and_references_original() {
        let user_id = UserId::generate();
        let original = CoinTransaction::earn(
            user_id,
            "rating_reward",
            20,
            20,
            "Rated a chapter".into(),
            serde_json::Value::Null,
        );
        let reversal = CoinTransaction::reversal(&original, 0);

        assert_eq!(reversal.coins, -20);
        assert_eq!(reversal.refund_of, Some(original.id));
        assert_eq!(reversal.kind, TransactionType::Adjust);
    }

    #[test]
    fn summary_from_log() {
        let user_id = UserId::generate();
        let txs = vec![
            CoinTransaction::earn(
                user_id,
                "rating_reward",
                2,
                2,
                "rate".into(),
                serde_json::Value::Null,
            ),
            CoinTransaction::adjust(user_id, 200, 202, "promo".into()),
            CoinTransaction::redeem(
                user_id,
                100,
                102,
                REASON_CHAPTER_UNLOCK.into(),
                serde_json::Value::Null,
            ),
        ];

        let summary = CoinSummary::from_transactions(&txs);
        assert_eq!(summary.available, 102);
        assert_eq!(summary.earned, 202);
        assert_eq!(summary.used, 100);
    }
}
