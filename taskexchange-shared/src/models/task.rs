/// Task model and database operations
///
/// Tasks are units of referral work offering a point reward. The reward is
/// escrowed at creation time: the creator's balance is debited in the same
/// database transaction that inserts the task (see
/// [`ledger::create_task_escrow`](crate::ledger::create_task_escrow)).
///
/// # State Machine
///
/// ```text
/// active → completed
/// ```
///
/// A task completes when one of its submissions is approved; the escrowed
/// reward is paid out once.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('active', 'completed');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     creator_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     referral_link VARCHAR(2048) NOT NULL,
///     points_reward BIGINT NOT NULL CHECK (points_reward > 0),
///     status task_status NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is open for submissions
    Active,

    /// A submission was approved and the reward paid out
    Completed,
}

impl TaskStatus {
    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Active => "active",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parses status from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(TaskStatus::Active),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        matches!((self, target), (TaskStatus::Active, TaskStatus::Completed))
    }
}

/// Task model representing a referral task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// User who created the task and escrowed the reward
    pub creator_id: Uuid,

    /// Short human-readable title
    pub title: String,

    /// What the submitter is expected to do
    pub description: String,

    /// The referral link to follow
    pub referral_link: String,

    /// Points paid to the submitter on approval (positive)
    pub points_reward: i64,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Task row joined with its creator's username, for listings
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskWithCreator {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: String,
    pub referral_link: String,
    pub points_reward: i64,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,

    /// Creator's profile username
    pub creator_username: String,
}

/// Input for creating a new task
///
/// Consumed by [`ledger::create_task_escrow`](crate::ledger::create_task_escrow),
/// which inserts the row and debits the creator in one transaction.
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Creator (must hold at least `points_reward` points)
    pub creator_id: Uuid,

    /// Task title
    pub title: String,

    /// Task description
    pub description: String,

    /// Referral link
    pub referral_link: String,

    /// Reward escrowed from the creator (positive)
    pub points_reward: i64,
}

impl Task {
    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, creator_id, title, description, referral_link,
                   points_reward, status, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks by status with creator usernames, newest first
    pub async fn list_by_status(
        pool: &PgPool,
        status: TaskStatus,
    ) -> Result<Vec<TaskWithCreator>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, TaskWithCreator>(
            r#"
            SELECT t.id, t.creator_id, t.title, t.description, t.referral_link,
                   t.points_reward, t.status, t.created_at,
                   p.username AS creator_username
            FROM tasks t
            JOIN profiles p ON p.user_id = t.creator_id
            WHERE t.status = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Counts tasks created by a user
    pub async fn count_by_creator(pool: &PgPool, creator_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE creator_id = $1")
            .bind(creator_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Active.as_str(), "active");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_task_status_parse() {
        assert_eq!(TaskStatus::parse("active"), Some(TaskStatus::Active));
        assert_eq!(TaskStatus::parse("completed"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::parse("bogus"), None);
    }

    #[test]
    fn test_task_status_transitions() {
        assert!(TaskStatus::Active.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Active));
        assert!(!TaskStatus::Active.can_transition_to(TaskStatus::Active));
    }
}
