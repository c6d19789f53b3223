/// Dashboard endpoint
///
/// `GET /v1/dashboard` - Per-user stats overview: point balance, tasks
/// created, tasks completed (approved submissions), pending submissions,
/// and the five most recent transactions.
///
/// The five reads are independent and issued concurrently
/// (fire-and-wait-all); they target disjoint data.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use taskexchange_shared::{
    auth::middleware::AuthContext,
    models::{
        profile::Profile,
        submission::{Submission, SubmissionStatus},
        task::Task,
        transaction::Transaction,
    },
};
use serde::Serialize;

/// How many recent transactions the dashboard shows
const RECENT_TRANSACTIONS: i64 = 5;

/// Dashboard response
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Current point balance
    pub total_points: i64,

    /// Tasks created by this user
    pub tasks_created: i64,

    /// This user's approved submissions
    pub tasks_completed: i64,

    /// This user's submissions still awaiting review
    pub pending_submissions: i64,

    /// Most recent transactions, newest first
    pub recent_transactions: Vec<Transaction>,
}

/// Dashboard handler
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DashboardResponse>> {
    let (profile, tasks_created, tasks_completed, pending_submissions, recent_transactions) =
        tokio::try_join!(
            Profile::find_by_user_id(&state.db, auth.user_id),
            Task::count_by_creator(&state.db, auth.user_id),
            Submission::count_by_submitter_and_status(
                &state.db,
                auth.user_id,
                SubmissionStatus::Approved
            ),
            Submission::count_by_submitter_and_status(
                &state.db,
                auth.user_id,
                SubmissionStatus::Pending
            ),
            Transaction::recent_by_user(&state.db, auth.user_id, RECENT_TRANSACTIONS),
        )?;

    let profile = profile.ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(DashboardResponse {
        total_points: profile.points,
        tasks_created,
        tasks_completed,
        pending_submissions,
        recent_transactions,
    }))
}
