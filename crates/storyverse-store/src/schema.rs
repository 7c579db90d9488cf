//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary user records, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Coin transactions, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by user, keyed by `user_id || transaction_id`.
    /// Value is empty (index only).
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";

    /// Index: refunds by original transaction, keyed by the original
    /// `transaction_id`. Value is the reversal's `transaction_id`.
    pub const REFUNDS: &str = "refunds";

    /// Reward rules, keyed by rule key.
    pub const REWARD_RULES: &str = "reward_rules";

    /// Genres, keyed by slug.
    pub const GENRES: &str = "genres";

    /// Story runs, keyed by `run_id`.
    pub const RUNS: &str = "runs";

    /// Chapter unlocks, keyed by `run_id || chapter`.
    pub const UNLOCKS: &str = "unlocks";

    /// Chapter ratings, keyed by `run_id || node_id`.
    pub const RATINGS: &str = "ratings";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::USERS,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
        cf::REFUNDS,
        cf::REWARD_RULES,
        cf::GENRES,
        cf::RUNS,
        cf::UNLOCKS,
        cf::RATINGS,
    ]
}
