//! Error types for Storyverse storage.
//!
//! Business-rule violations (`InsufficientCoins`, `AlreadyUnlocked`,
//! `AlreadyRefunded`, `RuleUnavailable`) live here because they are detected
//! inside the store's atomic read-check-write operations.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record ("user", "run", "transaction", ...).
        entity: &'static str,
        /// The id that was looked up.
        id: String,
    },

    /// A debit would drive the balance below zero.
    #[error("insufficient coins: available={available}, required={required}")]
    InsufficientCoins {
        /// Current balance.
        available: i64,
        /// Coins the operation needed.
        required: i64,
    },

    /// The chapter was already unlocked for this run.
    #[error("chapter {chapter} already unlocked")]
    AlreadyUnlocked {
        /// The chapter position.
        chapter: u8,
    },

    /// A refund already references this transaction.
    #[error("transaction already refunded: {transaction_id}")]
    AlreadyRefunded {
        /// The transaction that was already refunded.
        transaction_id: String,
    },

    /// The reward rule is missing or disabled.
    #[error("reward rule disabled or missing: {key}")]
    RuleUnavailable {
        /// The rule key that was looked up.
        key: String,
    },

    /// Invalid amount (zero delta, negative cost, ...).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

impl StoreError {
    /// Convenience constructor for `NotFound`.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
