/// Task endpoints
///
/// - `GET /v1/tasks?status=active|completed` - List tasks with creator names
/// - `POST /v1/tasks` - Create a task (escrows the reward)
/// - `GET /v1/tasks/:id` - Fetch one task
/// - `POST /v1/tasks/:id/submissions` - Submit proof of completion
///
/// Creating a task debits the creator's balance by the reward amount in the
/// same database transaction that inserts the task. The balance check is
/// the ledger's conditional update, not a prior read, so concurrent
/// creations by the same user cannot overspend.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use taskexchange_shared::{
    auth::middleware::AuthContext,
    ledger,
    models::{
        submission::{CreateSubmission, Submission},
        task::{CreateTask, Task, TaskStatus, TaskWithCreator},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Task list query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct ListTasksQuery {
    /// Status filter: "active" (default) or "completed"
    pub status: Option<String>,
}

/// Create task request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// What the submitter is expected to do
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    /// The referral link to follow
    #[validate(url(message = "Referral link must be a valid URL"))]
    pub referral_link: String,

    /// Points paid out on approval
    #[validate(range(min = 1, message = "Reward must be at least 1 point"))]
    pub points_reward: i64,
}

/// Submit proof request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitProofRequest {
    /// Link to the completion evidence (screenshot, etc.)
    #[validate(url(message = "Proof must be a valid URL"))]
    pub proof_url: String,
}

/// Task list response
#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    /// Tasks matching the filter, newest first
    pub tasks: Vec<TaskWithCreator>,
}

/// Lists tasks filtered by status, newest first
///
/// # Errors
///
/// - `400 Bad Request`: Unknown status filter
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<ListTasksResponse>> {
    let status = match query.status.as_deref() {
        None => TaskStatus::Active,
        Some(s) => TaskStatus::parse(s)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown task status: {}", s)))?,
    };

    let tasks = Task::list_by_status(&state.db, status).await?;

    Ok(Json(ListTasksResponse { tasks }))
}

/// Fetches a single task
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Creates a task and escrows its reward
///
/// # Endpoint
///
/// ```text
/// POST /v1/tasks
/// Content-Type: application/json
///
/// {
///   "title": "Sign up for ExampleApp",
///   "description": "Use my referral link and verify your email",
///   "referral_link": "https://example.com/ref/123",
///   "points_reward": 100
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed, including an
///   insufficient points balance
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate().map_err(ApiError::from_validation)?;

    tracing::info!(
        creator_id = %auth.user_id,
        title = %req.title,
        points_reward = req.points_reward,
        "Creating task"
    );

    let task = ledger::create_task_escrow(
        &state.db,
        CreateTask {
            creator_id: auth.user_id,
            title: req.title,
            description: req.description,
            referral_link: req.referral_link,
            points_reward: req.points_reward,
        },
    )
    .await?;

    Ok(Json(task))
}

/// Submits proof of completion for a task
///
/// The task must be active and the caller must not be its creator.
///
/// # Errors
///
/// - `404 Not Found`: Task does not exist
/// - `409 Conflict`: Task is no longer active
/// - `403 Forbidden`: Caller created this task
pub async fn submit_proof(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<SubmitProofRequest>,
) -> ApiResult<Json<Submission>> {
    req.validate().map_err(ApiError::from_validation)?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if task.status != TaskStatus::Active {
        return Err(ApiError::Conflict("Task is no longer active".to_string()));
    }

    if task.creator_id == auth.user_id {
        return Err(ApiError::Forbidden(
            "You cannot submit proof for your own task".to_string(),
        ));
    }

    let submission = Submission::create(
        &state.db,
        CreateSubmission {
            task_id,
            submitter_id: auth.user_id,
            proof_url: req.proof_url,
        },
    )
    .await?;

    tracing::info!(
        submission_id = %submission.id,
        task_id = %task_id,
        submitter_id = %auth.user_id,
        "Proof submitted"
    );

    Ok(Json(submission))
}
