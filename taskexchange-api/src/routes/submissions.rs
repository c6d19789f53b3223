/// Submission review endpoints
///
/// - `GET /v1/submissions/pending` - The review queue
/// - `POST /v1/submissions/:id/decide` - Approve or reject a submission
///
/// The decision is the settlement: approving flips the submission status,
/// completes the task, credits the escrowed reward to the submitter, and
/// writes their notification, all in one database transaction inside
/// [`ledger::settle_submission`]. Each submission is decided at most once.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use taskexchange_shared::{
    auth::middleware::AuthContext,
    ledger,
    models::submission::{Submission, SubmissionForReview, SubmissionStatus},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Decide request
#[derive(Debug, Clone, Deserialize)]
pub struct DecideRequest {
    /// true = approve (settle the reward), false = reject
    pub approve: bool,
}

/// Decide response
#[derive(Debug, Serialize)]
pub struct DecideResponse {
    /// The submission in its terminal state
    pub submission: Submission,

    /// New status as a string, for convenience
    pub status: SubmissionStatus,

    /// Points credited to the submitter (0 on rejection)
    pub points_settled: i64,
}

/// Review queue response
#[derive(Debug, Serialize)]
pub struct PendingSubmissionsResponse {
    /// Pending submissions visible to the caller, newest first
    pub submissions: Vec<SubmissionForReview>,
}

/// Lists pending submissions visible to the caller
///
/// Moderators see every pending submission; other users see pending
/// submissions on their own tasks only.
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PendingSubmissionsResponse>> {
    let submissions = if auth.is_moderator() {
        Submission::list_pending(&state.db).await?
    } else {
        Submission::list_pending_for_creator(&state.db, auth.user_id).await?
    };

    Ok(Json(PendingSubmissionsResponse { submissions }))
}

/// Decides a pending submission
///
/// # Endpoint
///
/// ```text
/// POST /v1/submissions/:id/decide
/// Content-Type: application/json
///
/// { "approve": true }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Submission does not exist
/// - `403 Forbidden`: Caller is neither the task creator nor a moderator
/// - `409 Conflict`: Submission was already decided, or the task's reward
///   was already settled to another submission
pub async fn decide(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(submission_id): Path<Uuid>,
    Json(req): Json<DecideRequest>,
) -> ApiResult<Json<DecideResponse>> {
    let outcome = ledger::settle_submission(
        &state.db,
        submission_id,
        req.approve,
        auth.user_id,
        auth.is_moderator(),
    )
    .await?;

    // The notification row is committed; now push it to live subscribers
    state.notifications.publish(outcome.notification);

    Ok(Json(DecideResponse {
        status: outcome.submission.status,
        points_settled: outcome.points_settled,
        submission: outcome.submission,
    }))
}
