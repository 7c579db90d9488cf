//! `RocksDB` storage layer for Storyverse.
//!
//! This crate provides persistent storage for users, coin transactions,
//! reward rules, genres, story runs, ratings and chapter unlocks using
//! `RocksDB` with column families for efficient indexing.
//!
//! # Architecture
//!
//! Simple operations are plain gets/puts. Ledger mutations are *compound*
//! operations: each one serializes on a per-user lock for the whole
//! read-check-write sequence and commits through a single `WriteBatch`, so a
//! crash leaves either nothing or everything. The transaction log is
//! append-only; the `coins` field on a user is a cache of its signed sum.
//!
//! # Example
//!
//! ```no_run
//! use storyverse_store::{RocksStore, Store};
//! use storyverse_core::{User, UserId};
//!
//! let store = RocksStore::open("/tmp/storyverse-db").unwrap();
//!
//! let user = User::new(UserId::generate(), None);
//! store.put_user(&user).unwrap();
//!
//! let tx = store.record_adjust(&user.id, 50, "welcome bonus").unwrap();
//! assert_eq!(tx.balance_after, 50);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::{DateTime, Utc};

use storyverse_core::{
    ChapterUnlock, CoinSummary, CoinTransaction, Genre, RewardRule, RunId, StoryRun,
    TransactionId, User, UserId,
};

/// Result of an earn attempt.
///
/// `awarded` may be less than the rule amount (daily cap partially reached)
/// or zero (cap exhausted), in which case no transaction is appended.
#[derive(Debug, Clone)]
pub struct EarnOutcome {
    /// Coins actually granted.
    pub awarded: i64,

    /// The appended transaction, absent when the grant clamped to zero.
    pub transaction: Option<CoinTransaction>,

    /// Balance after the operation.
    pub balance: i64,
}

/// Result of a successful chapter unlock.
#[derive(Debug, Clone)]
pub struct UnlockReceipt {
    /// The persisted unlock record.
    pub unlock: ChapterUnlock,

    /// Balance after the debit.
    pub balance: i64,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations behind the same service code.
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert or update a user record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_user(&self, user: &User) -> Result<()>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// List users (unordered), with pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_users(&self, limit: usize, offset: usize) -> Result<Vec<User>>;

    // =========================================================================
    // Reward Rule Operations
    // =========================================================================

    /// Insert or update a reward rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_rule(&self, rule: &RewardRule) -> Result<()>;

    /// Get a reward rule by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_rule(&self, key: &str) -> Result<Option<RewardRule>>;

    /// List all reward rules, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_rules(&self) -> Result<Vec<RewardRule>>;

    /// Insert the given rules where no rule with the same key exists yet.
    /// Returns how many were inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn seed_rules(&self, rules: &[RewardRule]) -> Result<usize>;

    // =========================================================================
    // Genre Operations
    // =========================================================================

    /// Insert or update a genre.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_genre(&self, genre: &Genre) -> Result<()>;

    /// Get a genre by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_genre(&self, slug: &str) -> Result<Option<Genre>>;

    /// List all genres, ordered by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_genres(&self) -> Result<Vec<Genre>>;

    /// Delete a genre by slug.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the genre doesn't exist.
    fn delete_genre(&self, slug: &str) -> Result<()>;

    // =========================================================================
    // Run Operations
    // =========================================================================

    /// Insert or update a story run.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_run(&self, run: &StoryRun) -> Result<()>;

    /// Get a run by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_run(&self, run_id: &RunId) -> Result<Option<StoryRun>>;

    /// Get the stored rating for a node within a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_rating(&self, run_id: &RunId, node_id: &str) -> Result<Option<u8>>;

    /// Store a rating for a node within a run (overwrites).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_rating(&self, run_id: &RunId, node_id: &str, rating: u8) -> Result<()>;

    /// Get the unlock record for a chapter within a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_unlock(&self, run_id: &RunId, chapter: u8) -> Result<Option<ChapterUnlock>>;

    /// Whether a chapter has been unlocked for a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn is_chapter_unlocked(&self, run_id: &RunId, chapter: u8) -> Result<bool> {
        Ok(self.get_unlock(run_id, chapter)?.is_some())
    }

    // =========================================================================
    // Transaction Queries
    // =========================================================================

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CoinTransaction>>;

    /// List transactions for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CoinTransaction>>;

    /// Search the ledger, newest first: optionally restricted to one user,
    /// optionally filtered by a case-insensitive substring of `reason`.
    /// The filter is applied before pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn search_transactions(
        &self,
        user_id: Option<&UserId>,
        q: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CoinTransaction>>;

    // =========================================================================
    // Ledger Compound Operations
    // =========================================================================
    //
    // Each of these serializes on the user's lock for the whole
    // read-check-write sequence and commits via one atomic WriteBatch.

    /// Grant coins from a reward rule, honoring its daily cap.
    ///
    /// `now` is the grant evaluation instant; the cap window is the UTC
    /// calendar day containing it. A grant clamped to zero appends no
    /// transaction.
    ///
    /// # Errors
    ///
    /// - `StoreError::RuleUnavailable` if the rule is disabled.
    /// - `StoreError::NotFound` if the user doesn't exist.
    fn record_earn(
        &self,
        user_id: &UserId,
        rule: &RewardRule,
        reason: &str,
        meta: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<EarnOutcome>;

    /// Apply an administrator balance adjustment (positive or negative).
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if `delta` is zero.
    /// - `StoreError::NotFound` if the user doesn't exist.
    /// - `StoreError::InsufficientCoins` if a negative delta would drive the
    ///   balance below zero.
    fn record_adjust(&self, user_id: &UserId, delta: i64, reason: &str)
        -> Result<CoinTransaction>;

    /// Reverse a transaction: append a compensating transaction with
    /// inverted sign and a back-reference to the original.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the transaction doesn't exist.
    /// - `StoreError::AlreadyRefunded` if a reversal already references it.
    /// - `StoreError::InsufficientCoins` if the reversal would drive the
    ///   balance below zero.
    fn record_refund(&self, transaction_id: &TransactionId) -> Result<CoinTransaction>;

    /// Purchase a chapter unlock: debit `cost` coins and persist the unlock
    /// record in the same batch.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the run or its user doesn't exist.
    /// - `StoreError::AlreadyUnlocked` if the chapter was already purchased.
    /// - `StoreError::InsufficientCoins` if the balance is short.
    fn unlock_chapter(&self, run_id: &RunId, chapter: u8, cost: i64) -> Result<UnlockReceipt>;

    /// Recompute a user's coin summary from the transaction log.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    fn coin_summary(&self, user_id: &UserId) -> Result<CoinSummary>;
}
