//! Core types for Storyverse.
//!
//! This crate provides the foundational types used throughout the Storyverse
//! platform:
//!
//! - **Identifiers**: `UserId`, `RunId`, `TransactionId`
//! - **Users**: `User`, `Plan`
//! - **Ledger**: `CoinTransaction`, `TransactionType`, `CoinSummary`
//! - **Reward rules**: `RewardRule`
//! - **Stories**: `StoryRun`, `Genre`, `ChapterUnlock`, chapter gate policy
//!
//! # Coins
//!
//! Coins are a virtual currency stored as `i64`. Every balance change is an
//! immutable `CoinTransaction`; a user's `coins` field is a cached aggregate
//! of the signed sum of their transaction log.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;
pub mod ledger;
pub mod rules;
pub mod story;
pub mod user;

pub use ids::{IdError, RunId, TransactionId, UserId};
pub use ledger::{CoinSummary, CoinTransaction, TransactionType, REASON_CHAPTER_UNLOCK};
pub use rules::{default_rules, RewardRule, RULE_RATING_REWARD};
pub use story::{
    chapter_access, chapter_is_free, ChapterAccess, ChapterUnlock, Genre, StoryRun,
    DEFAULT_CHAPTER_UNLOCK_COST, FREE_CHAPTERS, JOURNEY_STEPS,
};
pub use user::{Plan, User};
