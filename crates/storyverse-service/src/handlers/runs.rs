//! Story run handlers: starting runs, choosing paths, rating chapters and
//! unlocking paid chapters.
//!
//! The chapter gate lives here: both reading the current node and advancing
//! into the next step run the same `chapter_access` decision, so a run can
//! never sit on a chapter its owner could not read.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use storyverse_core::{
    chapter_access, chapter_is_free, ChapterAccess, RunId, StoryRun, User, JOURNEY_STEPS,
    RULE_RATING_REWARD,
};
use storyverse_store::{Store, StoreError};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Run response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    /// Run ID.
    pub run_id: String,
    /// Current chapter position.
    pub step_no: u8,
    /// Genre slugs chosen so far.
    pub path: Vec<String>,
    /// Whether the journey is finished.
    pub completed: bool,
    /// Started timestamp.
    pub created_at: String,
}

impl From<&StoryRun> for RunResponse {
    fn from(run: &StoryRun) -> Self {
        Self {
            run_id: run.id.to_string(),
            step_no: run.step_no,
            path: run.path.clone(),
            completed: run.completed,
            created_at: run.created_at.to_rfc3339(),
        }
    }
}

/// Start a new run for the authenticated user.
pub async fn create_run(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<RunResponse>, ApiError> {
    // Runs belong to registered users
    state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let run = StoryRun::new(auth.user_id);
    state.store.put_run(&run)?;

    tracing::info!(run_id = %run.id, user_id = %auth.user_id, "Run started");

    Ok(Json(RunResponse::from(&run)))
}

/// Fetch a run and verify the caller owns it (admins may read any run).
fn owned_run(state: &AppState, auth: &AuthUser, run_id: &str) -> Result<StoryRun, ApiError> {
    let run_id = run_id
        .parse::<RunId>()
        .map_err(|_| ApiError::BadRequest("Invalid run ID".into()))?;

    let run = state
        .store
        .get_run(&run_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Run not found: {run_id}")))?;

    if run.user_id != auth.user_id && !auth.is_admin {
        return Err(ApiError::Forbidden);
    }

    Ok(run)
}

/// Run the gate decision for one chapter of a run.
fn check_gate(state: &AppState, user: &User, run: &StoryRun, step_no: u8) -> Result<(), ApiError> {
    let unlocked = state.store.is_chapter_unlocked(&run.id, step_no)?;
    match chapter_access(user.plan, step_no, unlocked, state.config.chapter_unlock_cost) {
        ChapterAccess::Granted => Ok(()),
        ChapterAccess::RequiresUnlock { required } => Err(ApiError::ChapterLocked {
            chapter: step_no,
            required,
            available: user.coins,
        }),
    }
}

/// Current node response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentNodeResponse {
    /// Run ID.
    pub run_id: String,
    /// Current chapter position.
    pub step_no: u8,
    /// The genre chosen at the current step, if any.
    pub genre: Option<String>,
    /// Whether the journey is finished.
    pub completed: bool,
    /// Whether the current chapter is free for everyone.
    pub chapter_is_free: bool,
}

/// Get the current node of a run, or a `CHAPTER_LOCKED` error when the
/// chapter is behind the paywall.
pub async fn current(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(run_id): Path<String>,
) -> Result<Json<CurrentNodeResponse>, ApiError> {
    let run = owned_run(&state, &auth, &run_id)?;
    let user = state
        .store
        .get_user(&run.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    check_gate(&state, &user, &run, run.step_no)?;

    Ok(Json(CurrentNodeResponse {
        run_id: run.id.to_string(),
        step_no: run.step_no,
        genre: run.current_genre().map(ToString::to_string),
        completed: run.completed,
        chapter_is_free: chapter_is_free(run.step_no),
    }))
}

/// Choose request.
#[derive(Debug, Deserialize)]
pub struct ChooseRequest {
    /// The genre slug to follow.
    pub genre: String,
}

/// Record a genre choice and advance the run.
pub async fn choose(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(run_id): Path<String>,
    Json(body): Json<ChooseRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    let mut run = owned_run(&state, &auth, &run_id)?;

    if run.completed {
        return Err(ApiError::Conflict("Run is already completed".into()));
    }
    if state.store.get_genre(&body.genre)?.is_none() {
        return Err(ApiError::BadRequest(format!("Unknown genre: {}", body.genre)));
    }

    let user = state
        .store
        .get_user(&run.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // The destination chapter must be readable before the run moves there
    if run.step_no < JOURNEY_STEPS {
        check_gate(&state, &user, &run, run.step_no + 1)?;
    }

    run.advance(body.genre);
    state.store.put_run(&run)?;

    tracing::info!(
        run_id = %run.id,
        user_id = %run.user_id,
        step_no = %run.step_no,
        completed = %run.completed,
        "Run advanced"
    );

    Ok(Json(RunResponse::from(&run)))
}

/// Rate request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    /// The chapter node being rated.
    pub node_id: String,
    /// Star rating, 1-5.
    pub rating: u8,
}

/// Rate response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResponse {
    /// Whether the rating was stored.
    pub ok: bool,
    /// Coins granted by the rating reward rule (0 when capped, re-rating,
    /// or the rule is disabled).
    pub coins_awarded: i64,
}

/// Rate a chapter node. The first rating of a node triggers the
/// `rating_reward` rule; re-rating updates the stored value only.
pub async fn rate(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(run_id): Path<String>,
    Json(body): Json<RateRequest>,
) -> Result<Json<RateResponse>, ApiError> {
    if !(1..=5).contains(&body.rating) {
        return Err(ApiError::BadRequest("Rating must be between 1 and 5".into()));
    }
    if body.node_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Node ID is required".into()));
    }

    let run = owned_run(&state, &auth, &run_id)?;

    let first_rating = state.store.get_rating(&run.id, &body.node_id)?.is_none();
    state.store.put_rating(&run.id, &body.node_id, body.rating)?;

    let mut coins_awarded = 0;
    if first_rating {
        match state.store.get_rule(RULE_RATING_REWARD)? {
            Some(rule) if rule.enabled => {
                let outcome = state.store.record_earn(
                    &run.user_id,
                    &rule,
                    "Rated a chapter",
                    serde_json::json!({
                        "run_id": run.id,
                        "node_id": body.node_id,
                        "rating": body.rating,
                    }),
                    chrono::Utc::now(),
                );

                match outcome {
                    Ok(outcome) => coins_awarded = outcome.awarded,
                    // The rule was disabled between the lookup and the
                    // grant; the rating still stands.
                    Err(StoreError::RuleUnavailable { .. }) => coins_awarded = 0,
                    Err(e) => return Err(e.into()),
                }
            }
            _ => {
                tracing::debug!(rule = RULE_RATING_REWARD, "Rating reward rule inactive");
            }
        }
    }

    tracing::info!(
        run_id = %run.id,
        user_id = %run.user_id,
        node_id = %body.node_id,
        rating = %body.rating,
        coins_awarded = %coins_awarded,
        "Chapter rated"
    );

    Ok(Json(RateResponse {
        ok: true,
        coins_awarded,
    }))
}

/// Unlock request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRequest {
    /// The paid chapter to unlock (3-5).
    pub chapter_number: u8,
}

/// Unlock response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockResponse {
    /// Whether the unlock succeeded.
    pub ok: bool,
    /// The unlocked chapter.
    pub chapter_number: u8,
    /// Balance after the debit.
    pub balance: i64,
    /// The redeem transaction that paid for the unlock.
    pub transaction_id: String,
}

/// Purchase a chapter unlock for a run.
pub async fn unlock(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(run_id): Path<String>,
    Json(body): Json<UnlockRequest>,
) -> Result<Json<UnlockResponse>, ApiError> {
    let chapter = body.chapter_number;
    if chapter_is_free(chapter) {
        return Err(ApiError::BadRequest(format!(
            "Chapter {chapter} is free and needs no unlock"
        )));
    }
    if chapter > JOURNEY_STEPS {
        return Err(ApiError::BadRequest(format!(
            "Chapter {chapter} does not exist"
        )));
    }

    let run = owned_run(&state, &auth, &run_id)?;
    let user = state
        .store
        .get_user(&run.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // Paying for a chapter the plan already grants would waste coins
    if user.plan.bypasses_chapter_gate() {
        return Err(ApiError::Conflict(
            "Current plan already grants access to paid chapters".into(),
        ));
    }

    let receipt = state
        .store
        .unlock_chapter(&run.id, chapter, state.config.chapter_unlock_cost)?;

    tracing::info!(
        run_id = %run.id,
        user_id = %run.user_id,
        chapter = %chapter,
        cost = %state.config.chapter_unlock_cost,
        new_balance = %receipt.balance,
        "Chapter unlocked"
    );

    Ok(Json(UnlockResponse {
        ok: true,
        chapter_number: chapter,
        balance: receipt.balance,
        transaction_id: receipt.unlock.transaction_id.to_string(),
    }))
}
