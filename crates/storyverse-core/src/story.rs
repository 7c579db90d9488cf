//! Story run and chapter gate types for Storyverse.
//!
//! A run is one user's traversal of a story: five fixed chapter positions,
//! with a genre-tagged path chosen at each step. Chapters 1–2 are free;
//! chapters 3–5 are paid for free-plan users and must be unlocked with coins
//! unless the plan bypasses the gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Plan, RunId, TransactionId, UserId};

/// Number of chapter positions in every journey.
pub const JOURNEY_STEPS: u8 = 5;

/// Chapters up to and including this position are always free.
pub const FREE_CHAPTERS: u8 = 2;

/// Default coin cost of unlocking a paid chapter (service-configurable).
pub const DEFAULT_CHAPTER_UNLOCK_COST: i64 = 100;

/// Whether a chapter position is free for everyone.
#[must_use]
pub const fn chapter_is_free(step_no: u8) -> bool {
    step_no <= FREE_CHAPTERS
}

/// The chapter gate decision for one (user plan, chapter, unlock state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterAccess {
    /// The chapter may be displayed.
    Granted,

    /// The chapter is paywalled; unlocking costs `required` coins.
    RequiresUnlock {
        /// Coins needed to unlock this chapter.
        required: i64,
    },
}

/// Decide whether a chapter may be displayed.
///
/// Chapters 1–2 are always granted. Paid chapters are granted to plans that
/// bypass the gate and to runs that have purchased an unlock.
#[must_use]
pub fn chapter_access(plan: Plan, step_no: u8, unlocked: bool, unlock_cost: i64) -> ChapterAccess {
    if chapter_is_free(step_no) || plan.bypasses_chapter_gate() || unlocked {
        ChapterAccess::Granted
    } else {
        ChapterAccess::RequiresUnlock {
            required: unlock_cost,
        }
    }
}

/// A user's in-progress traversal of a story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRun {
    /// The run ID.
    pub id: RunId,

    /// The user traversing the story.
    pub user_id: UserId,

    /// Current chapter position, 1-based.
    pub step_no: u8,

    /// Genre slug chosen at each completed step, in order.
    pub path: Vec<String>,

    /// Whether the journey has reached the end.
    pub completed: bool,

    /// When the run was started.
    pub created_at: DateTime<Utc>,

    /// When the run was last advanced.
    pub updated_at: DateTime<Utc>,
}

impl StoryRun {
    /// Start a new run at chapter 1.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: RunId::generate(),
            user_id,
            step_no: 1,
            path: Vec::new(),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// The genre chosen at the current step, if any step has been chosen.
    #[must_use]
    pub fn current_genre(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    /// Record a genre choice and advance. The final step completes the run
    /// instead of moving past it.
    pub fn advance(&mut self, genre_slug: String) {
        self.path.push(genre_slug);
        if self.step_no >= JOURNEY_STEPS {
            self.completed = true;
        } else {
            self.step_no += 1;
        }
        self.updated_at = Utc::now();
    }
}

/// A genre tag users pick between at each step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    /// URL-safe identifier.
    pub slug: String,

    /// Display label.
    pub label: String,
}

/// A purchased unlock of one paid chapter within one run. Terminal: once
/// written it is never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterUnlock {
    /// The run the unlock belongs to.
    pub run_id: RunId,

    /// The unlocked chapter position.
    pub chapter: u8,

    /// The redeem transaction that paid for the unlock.
    pub transaction_id: TransactionId,

    /// When the unlock was purchased.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_two_chapters_are_free() {
        assert!(chapter_is_free(1));
        assert!(chapter_is_free(2));
        assert!(!chapter_is_free(3));
        assert!(!chapter_is_free(5));
    }

    #[test]
    fn free_plan_needs_unlock_for_paid_chapters() {
        assert_eq!(
            chapter_access(Plan::Free, 3, false, 100),
            ChapterAccess::RequiresUnlock { required: 100 }
        );
        assert_eq!(chapter_access(Plan::Free, 3, true, 100), ChapterAccess::Granted);
        assert_eq!(chapter_access(Plan::Free, 2, false, 100), ChapterAccess::Granted);
    }

    #[test]
    fn premium_and_creator_bypass_the_gate() {
        assert_eq!(chapter_access(Plan::Premium, 5, false, 100), ChapterAccess::Granted);
        assert_eq!(chapter_access(Plan::Creator, 4, false, 100), ChapterAccess::Granted);
    }

    #[test]
    fn run_advances_through_five_steps() {
        let mut run = StoryRun::new(UserId::generate());
        assert_eq!(run.step_no, 1);
        assert!(run.current_genre().is_none());

        for (i, genre) in ["fantasy", "mystery", "fantasy", "horror"].iter().enumerate() {
            run.advance((*genre).to_string());
            assert_eq!(run.step_no, i as u8 + 2);
            assert!(!run.completed);
        }

        run.advance("fantasy".to_string());
        assert_eq!(run.step_no, 5);
        assert!(run.completed);
        assert_eq!(run.path.len(), 5);
    }
}
