//! Storyverse HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    ApiErrorEnvelope, ChooseRequest, CoinSummary, CurrentNode, RateOutcome, RateRequest, Run,
    TransactionPage, UnlockOutcome, UnlockRequest,
};

/// Storyverse API client.
///
/// Provides methods for reading coin state and driving story runs on behalf
/// of an authenticated user.
#[derive(Debug, Clone)]
pub struct StoryverseClient {
    client: Client,
    base_url: String,
}

impl StoryverseClient {
    /// Create a new Storyverse client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g., `"http://storyverse:8080"`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new Storyverse client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn with_options(base_url: impl Into<String>, options: ClientOptions) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the authenticated user's coin summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn coin_summary(&self, user_token: &str) -> Result<CoinSummary, ClientError> {
        let url = format!("{}/api/coins/summary", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(user_token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// List the authenticated user's transaction history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn transactions(
        &self,
        user_token: &str,
        limit: usize,
        offset: usize,
    ) -> Result<TransactionPage, ClientError> {
        let url = format!(
            "{}/api/coins/transactions?limit={limit}&offset={offset}",
            self.base_url
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(user_token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Start a new story run.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn start_run(&self, user_token: &str) -> Result<Run, ClientError> {
        let url = format!("{}/api/runs", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(user_token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Fetch the current node of a run.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ChapterLocked` when the chapter is paywalled,
    /// or another error if the request fails.
    pub async fn current_node(
        &self,
        user_token: &str,
        run_id: &str,
    ) -> Result<CurrentNode, ClientError> {
        let url = format!("{}/api/runs/{run_id}/current", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(user_token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Choose a genre path at the current step.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ChapterLocked` when the destination chapter is
    /// paywalled, or another error if the request fails.
    pub async fn choose(
        &self,
        user_token: &str,
        run_id: &str,
        genre: impl Into<String>,
    ) -> Result<Run, ClientError> {
        let url = format!("{}/api/runs/{run_id}/choose", self.base_url);
        let request = ChooseRequest {
            genre: genre.into(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(user_token)
            .json(&request)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Rate a chapter node.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn rate(
        &self,
        user_token: &str,
        run_id: &str,
        node_id: impl Into<String>,
        rating: u8,
    ) -> Result<RateOutcome, ClientError> {
        let url = format!("{}/api/runs/{run_id}/rate", self.base_url);
        let request = RateRequest {
            node_id: node_id.into(),
            rating,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(user_token)
            .json(&request)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Purchase a chapter unlock.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InsufficientCoins` with the paywall figures
    /// when the balance is short, or another error if the request fails.
    pub async fn unlock(
        &self,
        user_token: &str,
        run_id: &str,
        chapter_number: u8,
    ) -> Result<UnlockOutcome, ClientError> {
        let url = format!("{}/api/runs/{run_id}/unlock", self.base_url);
        let request = UnlockRequest { chapter_number };

        let response = self
            .client
            .post(&url)
            .bearer_auth(user_token)
            .json(&request)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(_) => {
                return Err(ClientError::Api {
                    code: "unknown".to_string(),
                    message: format!("HTTP {status}"),
                    status: status.as_u16(),
                })
            }
        };

        // The two paywall bodies have fixed flat shapes
        if body.get("error").and_then(serde_json::Value::as_str) == Some("INSUFFICIENT_COINS") {
            return Err(ClientError::InsufficientCoins {
                available: body
                    .get("available")
                    .and_then(serde_json::Value::as_i64)
                    .unwrap_or(0),
                required: body
                    .get("required")
                    .and_then(serde_json::Value::as_i64)
                    .unwrap_or(0),
            });
        }
        if body.get("code").and_then(serde_json::Value::as_str) == Some("CHAPTER_LOCKED") {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let chapter = body
                .get("chapterNumber")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0) as u8;
            return Err(ClientError::ChapterLocked {
                chapter,
                required: body
                    .get("requiredCoins")
                    .and_then(serde_json::Value::as_i64)
                    .unwrap_or(0),
                available: body
                    .get("available")
                    .and_then(serde_json::Value::as_i64)
                    .unwrap_or(0),
            });
        }

        // Everything else uses the service-wide envelope
        match serde_json::from_value::<ApiErrorEnvelope>(body) {
            Ok(envelope) => Err(ClientError::Api {
                code: envelope.error.code,
                message: envelope.error.message,
                status: status.as_u16(),
            }),
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}
