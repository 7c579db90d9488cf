//! Reward rule types for Storyverse.
//!
//! Reward rules are keyed by string and configured by administrators at
//! runtime, so they are modeled as data looked up from the store rather than
//! a compile-time enum.

use serde::{Deserialize, Serialize};

/// Key of the rule that rewards rating a chapter.
pub const RULE_RATING_REWARD: &str = "rating_reward";

/// An admin-configurable reward policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRule {
    /// Stable identifier used by reward-triggering code paths.
    pub key: String,

    /// Display label for the admin dashboard.
    pub label: String,

    /// Coins granted per trigger. Always positive.
    pub coins: i64,

    /// Whether the rule currently grants anything.
    pub enabled: bool,

    /// Maximum coins a single user may earn from this rule per UTC calendar
    /// day. `None` means unlimited.
    pub daily_cap: Option<i64>,
}

impl RewardRule {
    /// The grant this rule allows given how many coins the user has already
    /// earned from it today.
    ///
    /// Uncapped rules grant the full amount. Capped rules clamp the grant to
    /// the remaining daily allowance, which may be zero.
    #[must_use]
    pub fn clamp_grant(&self, granted_today: i64) -> i64 {
        match self.daily_cap {
            None => self.coins,
            Some(cap) => self.coins.min((cap - granted_today).max(0)),
        }
    }
}

/// Rules seeded into a fresh store. Admins can edit or disable them later.
#[must_use]
pub fn default_rules() -> Vec<RewardRule> {
    vec![RewardRule {
        key: RULE_RATING_REWARD.to_string(),
        label: "Rate a chapter".to_string(),
        coins: 2,
        enabled: true,
        daily_cap: Some(10),
    }]
}
