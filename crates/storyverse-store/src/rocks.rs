//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store`
//! trait. Ledger mutations serialize on a per-user lock registry so that the
//! read-check-write sequence behind each compound operation has at most one
//! writer per user at a time; the writes themselves go through `WriteBatch`
//! so they are all-or-nothing.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveTime, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use storyverse_core::{
    ChapterUnlock, CoinSummary, CoinTransaction, Genre, RewardRule, RunId, StoryRun,
    TransactionId, TransactionType, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{EarnOutcome, Store, UnlockReceipt};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            user_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// The serialization handle for one user's ledger. All compound
    /// operations hold this for their whole read-check-write sequence.
    fn user_lock(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut registry = self.user_locks.lock().expect("user lock registry poisoned");
        registry.entry(*user_id).or_default().clone()
    }

    fn get_user_required(&self, user_id: &UserId) -> Result<User> {
        self.get_user(user_id)?
            .ok_or_else(|| StoreError::not_found("user", user_id))
    }

    /// Sum of coins this user has earned from `rule_key` since `since`.
    ///
    /// Scans the user-transaction index from the ULID floor of `since`;
    /// counts gross earn transactions only, so refunds do not restore the
    /// daily allowance.
    fn earned_from_rule_since(
        &self,
        user_id: &UserId,
        rule_key: &str,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let prefix = keys::user_transactions_prefix(user_id);
        let floor = keys::user_transactions_since(user_id, since);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&floor, rocksdb::Direction::Forward),
        );

        let mut total = 0;
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }

            let tx_id = keys::extract_transaction_id_from_user_key(&key);
            if let Some(tx) = self.get_transaction(&tx_id)? {
                if tx.kind == TransactionType::Earn && tx.rule_key.as_deref() == Some(rule_key) {
                    total += tx.coins;
                }
            }
        }

        Ok(total)
    }

    /// Write the updated user plus a new ledger transaction (and its user
    /// index entry) into `batch`.
    fn stage_user_and_transaction(
        &self,
        batch: &mut WriteBatch,
        user: &User,
        transaction: &CoinTransaction,
    ) -> Result<()> {
        let cf_users = self.cf(cf::USERS)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        batch.put_cf(&cf_users, keys::user_key(&user.id), Self::serialize(user)?);
        batch.put_cf(
            &cf_tx,
            keys::transaction_key(&transaction.id),
            Self::serialize(transaction)?,
        );
        batch.put_cf(
            &cf_by_user,
            keys::user_transaction_key(&user.id, &transaction.id),
            [],
        );

        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

/// Start of the UTC calendar day containing `now`. Daily reward caps reset
/// at this boundary.
fn utc_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

impl Store for RocksStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn put_user(&self, user: &User) -> Result<()> {
        let cf = self.cf(cf::USERS)?;
        self.db
            .put_cf(&cf, keys::user_key(&user.id), Self::serialize(user)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let cf = self.cf(cf::USERS)?;
        self.db
            .get_cf(&cf, keys::user_key(user_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_users(&self, limit: usize, offset: usize) -> Result<Vec<User>> {
        let cf = self.cf(cf::USERS)?;
        let mut users = Vec::new();

        for item in self.db.iterator_cf(&cf, IteratorMode::Start).skip(offset) {
            if users.len() >= limit {
                break;
            }
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            users.push(Self::deserialize(&value)?);
        }

        Ok(users)
    }

    // =========================================================================
    // Reward Rule Operations
    // =========================================================================

    fn put_rule(&self, rule: &RewardRule) -> Result<()> {
        let cf = self.cf(cf::REWARD_RULES)?;
        self.db
            .put_cf(&cf, keys::rule_key(&rule.key), Self::serialize(rule)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_rule(&self, key: &str) -> Result<Option<RewardRule>> {
        let cf = self.cf(cf::REWARD_RULES)?;
        self.db
            .get_cf(&cf, keys::rule_key(key))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_rules(&self) -> Result<Vec<RewardRule>> {
        let cf = self.cf(cf::REWARD_RULES)?;
        let mut rules = Vec::new();

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            rules.push(Self::deserialize(&value)?);
        }

        Ok(rules)
    }

    fn seed_rules(&self, rules: &[RewardRule]) -> Result<usize> {
        let mut inserted = 0;
        for rule in rules {
            if self.get_rule(&rule.key)?.is_none() {
                self.put_rule(rule)?;
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    // =========================================================================
    // Genre Operations
    // =========================================================================

    fn put_genre(&self, genre: &Genre) -> Result<()> {
        let cf = self.cf(cf::GENRES)?;
        self.db
            .put_cf(&cf, keys::genre_key(&genre.slug), Self::serialize(genre)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_genre(&self, slug: &str) -> Result<Option<Genre>> {
        let cf = self.cf(cf::GENRES)?;
        self.db
            .get_cf(&cf, keys::genre_key(slug))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_genres(&self) -> Result<Vec<Genre>> {
        let cf = self.cf(cf::GENRES)?;
        let mut genres = Vec::new();

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            genres.push(Self::deserialize(&value)?);
        }

        Ok(genres)
    }

    fn delete_genre(&self, slug: &str) -> Result<()> {
        if self.get_genre(slug)?.is_none() {
            return Err(StoreError::not_found("genre", slug));
        }

        let cf = self.cf(cf::GENRES)?;
        self.db
            .delete_cf(&cf, keys::genre_key(slug))
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    // =========================================================================
    // Run Operations
    // =========================================================================

    fn put_run(&self, run: &StoryRun) -> Result<()> {
        let cf = self.cf(cf::RUNS)?;
        self.db
            .put_cf(&cf, keys::run_key(&run.id), Self::serialize(run)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_run(&self, run_id: &RunId) -> Result<Option<StoryRun>> {
        let cf = self.cf(cf::RUNS)?;
        self.db
            .get_cf(&cf, keys::run_key(run_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn get_rating(&self, run_id: &RunId, node_id: &str) -> Result<Option<u8>> {
        let cf = self.cf(cf::RATINGS)?;
        self.db
            .get_cf(&cf, keys::rating_key(run_id, node_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put_rating(&self, run_id: &RunId, node_id: &str, rating: u8) -> Result<()> {
        let cf = self.cf(cf::RATINGS)?;
        self.db
            .put_cf(
                &cf,
                keys::rating_key(run_id, node_id),
                Self::serialize(&rating)?,
            )
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_unlock(&self, run_id: &RunId, chapter: u8) -> Result<Option<ChapterUnlock>> {
        let cf = self.cf(cf::UNLOCKS)?;
        self.db
            .get_cf(&cf, keys::unlock_key(run_id, chapter))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    // =========================================================================
    // Transaction Queries
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CoinTransaction>> {
        let cf = self.cf(cf::TRANSACTIONS)?;
        self.db
            .get_cf(&cf, keys::transaction_key(transaction_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CoinTransaction>> {
        self.search_transactions(Some(user_id), None, limit, offset)
    }

    fn search_transactions(
        &self,
        user_id: Option<&UserId>,
        q: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CoinTransaction>> {
        let needle = q.map(str::to_lowercase);
        let matches = |tx: &CoinTransaction| {
            needle
                .as_ref()
                .map_or(true, |n| tx.reason.to_lowercase().contains(n))
        };

        let mut transactions = Vec::new();
        let mut skipped = 0;

        if let Some(user_id) = user_id {
            let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
            let prefix = keys::user_transactions_prefix(user_id);

            // Collect matching index keys, then reverse for newest-first
            // (ULID suffixes are time-ordered).
            let iter = self.db.iterator_cf(
                &cf_by_user,
                IteratorMode::From(&prefix, rocksdb::Direction::Forward),
            );

            let mut all_keys: Vec<Vec<u8>> = Vec::new();
            for item in iter {
                let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                if !key.starts_with(&prefix) {
                    break;
                }
                all_keys.push(key.to_vec());
            }
            all_keys.reverse();

            for key in all_keys {
                if transactions.len() >= limit {
                    break;
                }

                let tx_id = keys::extract_transaction_id_from_user_key(&key);
                let Some(tx) = self.get_transaction(&tx_id)? else {
                    continue;
                };
                if !matches(&tx) {
                    continue;
                }
                if skipped < offset {
                    skipped += 1;
                    continue;
                }
                transactions.push(tx);
            }
        } else {
            // Global listing: ULID primary keys sort by creation time, so
            // iterating from the end yields newest first.
            let cf_tx = self.cf(cf::TRANSACTIONS)?;
            for item in self.db.iterator_cf(&cf_tx, IteratorMode::End) {
                if transactions.len() >= limit {
                    break;
                }

                let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                let tx: CoinTransaction = Self::deserialize(&value)?;
                if !matches(&tx) {
                    continue;
                }
                if skipped < offset {
                    skipped += 1;
                    continue;
                }
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    // =========================================================================
    // Ledger Compound Operations
    // =========================================================================

    fn record_earn(
        &self,
        user_id: &UserId,
        rule: &RewardRule,
        reason: &str,
        meta: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<EarnOutcome> {
        if !rule.enabled {
            return Err(StoreError::RuleUnavailable {
                key: rule.key.clone(),
            });
        }

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().expect("user lock poisoned");

        let mut user = self.get_user_required(user_id)?;

        let granted_today = if rule.daily_cap.is_some() {
            self.earned_from_rule_since(user_id, &rule.key, utc_day_start(now))?
        } else {
            0
        };

        let grant = rule.clamp_grant(granted_today);
        if grant == 0 {
            tracing::debug!(
                user_id = %user_id,
                rule = %rule.key,
                granted_today = %granted_today,
                "Daily cap exhausted, no grant"
            );
            return Ok(EarnOutcome {
                awarded: 0,
                transaction: None,
                balance: user.coins,
            });
        }

        user.coins += grant;
        user.updated_at = now;

        let tx = CoinTransaction::earn(
            *user_id,
            &rule.key,
            grant,
            user.coins,
            reason.to_string(),
            meta,
        );

        let mut batch = WriteBatch::default();
        self.stage_user_and_transaction(&mut batch, &user, &tx)?;
        self.write(batch)?;

        Ok(EarnOutcome {
            awarded: grant,
            transaction: Some(tx),
            balance: user.coins,
        })
    }

    fn record_adjust(
        &self,
        user_id: &UserId,
        delta: i64,
        reason: &str,
    ) -> Result<CoinTransaction> {
        if delta == 0 {
            return Err(StoreError::InvalidAmount("delta must be non-zero".into()));
        }

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().expect("user lock poisoned");

        let mut user = self.get_user_required(user_id)?;

        let new_balance = user.coins + delta;
        if new_balance < 0 {
            return Err(StoreError::InsufficientCoins {
                available: user.coins,
                required: delta.abs(),
            });
        }

        user.coins = new_balance;
        user.updated_at = Utc::now();

        let tx = CoinTransaction::adjust(*user_id, delta, new_balance, reason.to_string());

        let mut batch = WriteBatch::default();
        self.stage_user_and_transaction(&mut batch, &user, &tx)?;
        self.write(batch)?;

        Ok(tx)
    }

    fn record_refund(&self, transaction_id: &TransactionId) -> Result<CoinTransaction> {
        let original = self
            .get_transaction(transaction_id)?
            .ok_or_else(|| StoreError::not_found("transaction", transaction_id))?;

        let lock = self.user_lock(&original.user_id);
        let _guard = lock.lock().expect("user lock poisoned");

        let cf_refunds = self.cf(cf::REFUNDS)?;
        let refund_marker = self
            .db
            .get_cf(&cf_refunds, keys::refund_key(transaction_id))
            .map_err(|e| StoreError::Database(e.to_string()))?;
        if refund_marker.is_some() {
            return Err(StoreError::AlreadyRefunded {
                transaction_id: transaction_id.to_string(),
            });
        }

        let mut user = self.get_user_required(&original.user_id)?;

        let new_balance = user.coins - original.coins;
        if new_balance < 0 {
            return Err(StoreError::InsufficientCoins {
                available: user.coins,
                required: original.coins,
            });
        }

        user.coins = new_balance;
        user.updated_at = Utc::now();

        let tx = CoinTransaction::reversal(&original, new_balance);

        let mut batch = WriteBatch::default();
        self.stage_user_and_transaction(&mut batch, &user, &tx)?;
        batch.put_cf(
            &cf_refunds,
            keys::refund_key(transaction_id),
            tx.id.to_bytes(),
        );
        self.write(batch)?;

        Ok(tx)
    }

    fn unlock_chapter(&self, run_id: &RunId, chapter: u8, cost: i64) -> Result<UnlockReceipt> {
        let run = self
            .get_run(run_id)?
            .ok_or_else(|| StoreError::not_found("run", run_id))?;

        let lock = self.user_lock(&run.user_id);
        let _guard = lock.lock().expect("user lock poisoned");

        if self.get_unlock(run_id, chapter)?.is_some() {
            return Err(StoreError::AlreadyUnlocked { chapter });
        }

        let mut user = self.get_user_required(&run.user_id)?;

        if user.coins < cost {
            return Err(StoreError::InsufficientCoins {
                available: user.coins,
                required: cost,
            });
        }

        user.coins -= cost;
        user.updated_at = Utc::now();

        let tx = CoinTransaction::redeem(
            user.id,
            cost,
            user.coins,
            storyverse_core::REASON_CHAPTER_UNLOCK.to_string(),
            serde_json::json!({ "run_id": run_id, "chapter": chapter }),
        );

        let unlock = ChapterUnlock {
            run_id: *run_id,
            chapter,
            transaction_id: tx.id,
            created_at: Utc::now(),
        };

        // Debit and unlock commit together: a crash leaves the chapter
        // either locked with coins untouched or unlocked with coins spent.
        let cf_unlocks = self.cf(cf::UNLOCKS)?;
        let mut batch = WriteBatch::default();
        self.stage_user_and_transaction(&mut batch, &user, &tx)?;
        batch.put_cf(
            &cf_unlocks,
            keys::unlock_key(run_id, chapter),
            Self::serialize(&unlock)?,
        );
        self.write(batch)?;

        Ok(UnlockReceipt {
            unlock,
            balance: user.coins,
        })
    }

    fn coin_summary(&self, user_id: &UserId) -> Result<CoinSummary> {
        let user = self.get_user_required(user_id)?;

        // Recompute from the log; the cached balance is not trusted here.
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let prefix = keys::user_transactions_prefix(user_id);
        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut transactions = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            let tx_id = keys::extract_transaction_id_from_user_key(&key);
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        let summary = CoinSummary::from_transactions(&transactions);

        if summary.available != user.coins {
            tracing::warn!(
                user_id = %user_id,
                cached = %user.coins,
                derived = %summary.available,
                "Cached balance disagrees with transaction log"
            );
        }

        Ok(summary)
    }
}
