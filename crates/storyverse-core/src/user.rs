//! User types for Storyverse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A Storyverse user.
///
/// The `coins` field is a cached aggregate: it must always equal the signed
/// sum of the user's coin transactions. The store maintains the cache; the
/// transaction log is the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user ID.
    pub id: UserId,

    /// Optional contact email (shown in the admin dashboard).
    pub email: Option<String>,

    /// Current coin balance. Never negative.
    pub coins: i64,

    /// The user's plan.
    pub plan: Plan,

    /// Whether the user is an administrator (dashboard flag).
    pub is_admin: bool,

    /// When the user was created.
    pub created_at: DateTime<Utc>,

    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new free-plan user with zero coins.
    #[must_use]
    pub fn new(id: UserId, email: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            coins: 0,
            plan: Plan::Free,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user has at least `amount` coins.
    #[must_use]
    pub fn has_sufficient_coins(&self, amount: i64) -> bool {
        self.coins >= amount
    }
}

/// Available plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    /// Free tier: paid chapters must be unlocked with coins.
    Free,

    /// Premium plan: all chapters readable without unlocking.
    Premium,

    /// Creator plan: premium access plus authoring tools.
    Creator,
}

impl Plan {
    /// Whether this plan reads paid chapters without per-chapter unlocks.
    #[must_use]
    pub const fn bypasses_chapter_gate(&self) -> bool {
        matches!(self, Self::Premium | Self::Creator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_starts_free_with_zero_coins() {
        let user = User::new(UserId::generate(), None);
        assert_eq!(user.coins, 0);
        assert_eq!(user.plan, Plan::Free);
        assert!(!user.is_admin);
    }

    #[test]
    fn sufficient_coins_boundary() {
        let mut user = User::new(UserId::generate(), None);
        user.coins = 100;

        assert!(user.has_sufficient_coins(99));
        assert!(user.has_sufficient_coins(100));
        assert!(!user.has_sufficient_coins(101));
    }

    #[test]
    fn gate_bypass_by_plan() {
        assert!(!Plan::Free.bypasses_chapter_gate());
        assert!(Plan::Premium.bypasses_chapter_gate());
        assert!(Plan::Creator.bypasses_chapter_gate());
    }
}
