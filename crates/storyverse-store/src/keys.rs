//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in
//! column families.

use chrono::{DateTime, Utc};
use ulid::Ulid;

use storyverse_core::{RunId, TransactionId, UserId};

/// Create a user key from a user ID.
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Create a user-transaction index key.
///
/// Format: `user_id (16 bytes) || transaction_id (16 bytes)`
///
/// Since ULIDs are time-ordered, a user's transactions sort chronologically
/// under this encoding.
#[must_use]
pub fn user_transaction_key(user_id: &UserId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// Create a prefix for iterating all transactions for a user.
#[must_use]
pub fn user_transactions_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create the lowest possible index key for a user's transactions at or
/// after `since`.
///
/// A ULID built from the timestamp with zeroed randomness sorts before every
/// real ULID of that millisecond, so seeking here and scanning forward visits
/// exactly the transactions created at `since` or later. Used for the
/// daily-cap window scan.
#[must_use]
pub fn user_transactions_since(user_id: &UserId, since: DateTime<Utc>) -> Vec<u8> {
    let millis = u64::try_from(since.timestamp_millis()).unwrap_or(0);
    let floor = Ulid::from_parts(millis, 0);

    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&floor.to_bytes());
    key
}

/// Extract the transaction ID from a user-transaction index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_transaction_id_from_user_key(key: &[u8]) -> TransactionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    TransactionId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create a reward rule key from a rule key string.
#[must_use]
pub fn rule_key(key: &str) -> Vec<u8> {
    key.as_bytes().to_vec()
}

/// Create a genre key from a slug.
#[must_use]
pub fn genre_key(slug: &str) -> Vec<u8> {
    slug.as_bytes().to_vec()
}

/// Create a run key from a run ID.
#[must_use]
pub fn run_key(run_id: &RunId) -> Vec<u8> {
    run_id.as_bytes().to_vec()
}

/// Create a chapter unlock key.
///
/// Format: `run_id (16 bytes) || chapter (1 byte)`
#[must_use]
pub fn unlock_key(run_id: &RunId, chapter: u8) -> Vec<u8> {
    let mut key = Vec::with_capacity(17);
    key.extend_from_slice(run_id.as_bytes());
    key.push(chapter);
    key
}

/// Create a rating key.
///
/// Format: `run_id (16 bytes) || node_id (utf-8)`
#[must_use]
pub fn rating_key(run_id: &RunId, node_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(16 + node_id.len());
    key.extend_from_slice(run_id.as_bytes());
    key.extend_from_slice(node_id.as_bytes());
    key
}

/// Create a refunds-index key from the original transaction ID.
#[must_use]
pub fn refund_key(original: &TransactionId) -> Vec<u8> {
    original.to_bytes().to_vec()
}
