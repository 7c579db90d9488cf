//! Client error types.

/// Errors returned by the Storyverse client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The balance was too short for the purchase.
    #[error("insufficient coins: available={available}, required={required}")]
    InsufficientCoins {
        /// Current balance.
        available: i64,
        /// Coins the operation needed.
        required: i64,
    },

    /// The requested chapter is behind the paywall.
    #[error("chapter {chapter} locked: required={required}, available={available}")]
    ChapterLocked {
        /// The locked chapter position.
        chapter: u8,
        /// Coins needed to unlock it.
        required: i64,
        /// The user's current balance.
        available: i64,
    },

    /// Any other API error.
    #[error("api error {status}: {code} - {message}")]
    Api {
        /// Machine-readable error code.
        code: String,
        /// Human-readable message.
        message: String,
        /// HTTP status code.
        status: u16,
    },
}
