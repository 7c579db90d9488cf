//! Reward rule configuration handlers (admin).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};

use storyverse_core::RewardRule;
use storyverse_store::Store;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::AppState;

/// List rules response.
#[derive(Debug, Serialize)]
pub struct ListRulesResponse {
    /// All configured rules, ordered by key.
    pub rules: Vec<RewardRule>,
}

/// List all reward rules.
pub async fn list_rules(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<ListRulesResponse>, ApiError> {
    let rules = state.store.list_rules()?;
    Ok(Json(ListRulesResponse { rules }))
}

/// Get a single reward rule.
pub async fn get_rule(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(key): Path<String>,
) -> Result<Json<RewardRule>, ApiError> {
    let rule = state
        .store
        .get_rule(&key)?
        .ok_or_else(|| ApiError::NotFound(format!("Rule not found: {key}")))?;

    Ok(Json(rule))
}

/// Create rule request.
#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    /// Stable identifier.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Coins granted per trigger.
    pub coins: i64,
    /// Whether the rule is active (default: true).
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Daily earning cap, if any.
    pub daily_cap: Option<i64>,
}

fn default_enabled() -> bool {
    true
}

/// Create a reward rule.
pub async fn create_rule(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Json(body): Json<CreateRuleRequest>,
) -> Result<Json<RewardRule>, ApiError> {
    validate_key(&body.key)?;
    validate_amounts(body.coins, body.daily_cap)?;

    if state.store.get_rule(&body.key)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Rule already exists: {}",
            body.key
        )));
    }

    let rule = RewardRule {
        key: body.key,
        label: body.label,
        coins: body.coins,
        enabled: body.enabled,
        daily_cap: body.daily_cap,
    };
    state.store.put_rule(&rule)?;

    tracing::info!(rule = %rule.key, admin = %admin.0.user_id, "Reward rule created");

    Ok(Json(rule))
}

/// Update rule request. `daily_cap` distinguishes "absent" (keep) from
/// `null` (remove the cap).
#[derive(Debug, Deserialize)]
pub struct UpdateRuleRequest {
    /// New display label, if changing.
    pub label: Option<String>,
    /// New grant amount, if changing.
    pub coins: Option<i64>,
    /// New enabled flag, if changing.
    pub enabled: Option<bool>,
    /// New daily cap: omitted = unchanged, `null` = uncapped.
    #[serde(default, deserialize_with = "double_option")]
    pub daily_cap: Option<Option<i64>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

/// Update a reward rule.
pub async fn update_rule(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(key): Path<String>,
    Json(body): Json<UpdateRuleRequest>,
) -> Result<Json<RewardRule>, ApiError> {
    let mut rule = state
        .store
        .get_rule(&key)?
        .ok_or_else(|| ApiError::NotFound(format!("Rule not found: {key}")))?;

    if let Some(label) = body.label {
        rule.label = label;
    }
    if let Some(coins) = body.coins {
        rule.coins = coins;
    }
    if let Some(enabled) = body.enabled {
        rule.enabled = enabled;
    }
    if let Some(daily_cap) = body.daily_cap {
        rule.daily_cap = daily_cap;
    }

    validate_amounts(rule.coins, rule.daily_cap)?;
    state.store.put_rule(&rule)?;

    tracing::info!(
        rule = %rule.key,
        admin = %admin.0.user_id,
        enabled = %rule.enabled,
        coins = %rule.coins,
        daily_cap = ?rule.daily_cap,
        "Reward rule updated"
    );

    Ok(Json(rule))
}

fn validate_key(key: &str) -> Result<(), ApiError> {
    if key.trim().is_empty() {
        return Err(ApiError::BadRequest("Rule key is required".into()));
    }
    Ok(())
}

fn validate_amounts(coins: i64, daily_cap: Option<i64>) -> Result<(), ApiError> {
    if coins <= 0 {
        return Err(ApiError::BadRequest("Coins must be positive".into()));
    }
    if let Some(cap) = daily_cap {
        if cap < 0 {
            return Err(ApiError::BadRequest("Daily cap must be non-negative".into()));
        }
    }
    Ok(())
}
