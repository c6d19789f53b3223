/// Submission model and database operations
///
/// A submission is a user's claim that they completed a task, backed by a
/// proof link. Submissions are decided exactly once, by the task's creator
/// or a moderator; the decision itself (status flip + settlement) lives in
/// [`ledger::settle_submission`](crate::ledger::settle_submission) so the
/// point movement and the status transition share one transaction.
///
/// # State Machine
///
/// ```text
/// pending → approved
///         → rejected
/// ```
///
/// Terminal states never transition again. The gate is enforced with a
/// conditional update (`WHERE status = 'pending'`), not a read-then-write.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE submission_status AS ENUM ('pending', 'approved', 'rejected');
///
/// CREATE TABLE task_submissions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     submitter_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     proof_url VARCHAR(2048) NOT NULL,
///     status submission_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     decided_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Submission review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "submission_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Waiting for the task creator or a moderator to decide
    Pending,

    /// Approved; the reward was settled to the submitter
    Approved,

    /// Rejected; no points moved
    Rejected,
}

impl SubmissionStatus {
    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    /// Checks if status is terminal (submission has been decided)
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Approved | SubmissionStatus::Rejected)
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: SubmissionStatus) -> bool {
        matches!(
            (self, target),
            (SubmissionStatus::Pending, SubmissionStatus::Approved)
                | (SubmissionStatus::Pending, SubmissionStatus::Rejected)
        )
    }
}

/// Submission model representing a proof-of-completion claim
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Submission {
    /// Unique submission ID
    pub id: Uuid,

    /// Task this submission claims to have completed
    pub task_id: Uuid,

    /// User who submitted the proof
    pub submitter_id: Uuid,

    /// Link to the completion evidence
    pub proof_url: String,

    /// Current review status
    pub status: SubmissionStatus,

    /// When the proof was submitted
    pub created_at: DateTime<Utc>,

    /// When the submission was decided (None while pending)
    pub decided_at: Option<DateTime<Utc>>,
}

/// Submission joined with task and submitter details, for the review queue
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubmissionForReview {
    pub id: Uuid,
    pub task_id: Uuid,
    pub proof_url: String,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,

    /// Title of the task being claimed
    pub task_title: String,

    /// Reward at stake
    pub points_reward: i64,

    /// Creator of the task (the default reviewer)
    pub task_creator_id: Uuid,

    /// Username of the submitter
    pub submitter_username: String,
}

/// Input for creating a new submission
#[derive(Debug, Clone)]
pub struct CreateSubmission {
    /// Task being claimed
    pub task_id: Uuid,

    /// User submitting the proof
    pub submitter_id: Uuid,

    /// Link to the completion evidence
    pub proof_url: String,
}

impl Submission {
    /// Creates a new submission in pending state
    pub async fn create(pool: &PgPool, data: CreateSubmission) -> Result<Self, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO task_submissions (task_id, submitter_id, proof_url)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, submitter_id, proof_url, status, created_at, decided_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.submitter_id)
        .bind(data.proof_url)
        .fetch_one(pool)
        .await?;

        Ok(submission)
    }

    /// Finds a submission by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, task_id, submitter_id, proof_url, status, created_at, decided_at
            FROM task_submissions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(submission)
    }

    /// Lists all pending submissions with task and submitter details
    ///
    /// The moderator review queue, newest first.
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<SubmissionForReview>, sqlx::Error> {
        let submissions = sqlx::query_as::<_, SubmissionForReview>(
            r#"
            SELECT s.id, s.task_id, s.proof_url, s.status, s.created_at,
                   t.title AS task_title,
                   t.points_reward,
                   t.creator_id AS task_creator_id,
                   p.username AS submitter_username
            FROM task_submissions s
            JOIN tasks t ON t.id = s.task_id
            JOIN profiles p ON p.user_id = s.submitter_id
            WHERE s.status = 'pending'
            ORDER BY s.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(submissions)
    }

    /// Lists pending submissions on tasks created by one user
    ///
    /// The review queue for a non-moderator: only claims against their own
    /// tasks.
    pub async fn list_pending_for_creator(
        pool: &PgPool,
        creator_id: Uuid,
    ) -> Result<Vec<SubmissionForReview>, sqlx::Error> {
        let submissions = sqlx::query_as::<_, SubmissionForReview>(
            r#"
            SELECT s.id, s.task_id, s.proof_url, s.status, s.created_at,
                   t.title AS task_title,
                   t.points_reward,
                   t.creator_id AS task_creator_id,
                   p.username AS submitter_username
            FROM task_submissions s
            JOIN tasks t ON t.id = s.task_id
            JOIN profiles p ON p.user_id = s.submitter_id
            WHERE s.status = 'pending' AND t.creator_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(creator_id)
        .fetch_all(pool)
        .await?;

        Ok(submissions)
    }

    /// Counts a user's submissions in a given status
    pub async fn count_by_submitter_and_status(
        pool: &PgPool,
        submitter_id: Uuid,
        status: SubmissionStatus,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM task_submissions WHERE submitter_id = $1 AND status = $2",
        )
        .bind(submitter_id)
        .bind(status)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}
