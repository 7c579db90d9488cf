//! Storyverse HTTP client SDK.
//!
//! A typed client for the Storyverse service, used by server-rendered
//! frontends and tooling. Paywall outcomes surface as typed errors
//! (`ClientError::ChapterLocked`, `ClientError::InsufficientCoins`) carrying
//! the figures the UI renders.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientOptions, StoryverseClient};
pub use error::ClientError;
pub use types::{
    CoinSummary, CurrentNode, RateOutcome, Run, TransactionPage, UnlockOutcome,
};
