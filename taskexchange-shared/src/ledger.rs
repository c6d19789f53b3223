/// The point ledger: every balance mutation in one place
///
/// All point movement goes through [`post`], which appends a signed ledger
/// entry and adjusts the profile balance inside a caller-supplied database
/// transaction. The non-negative balance invariant is enforced here with a
/// conditional update: a debit that would overdraw affects zero rows and
/// aborts the caller's transaction before anything is written.
///
/// On top of that primitive sit the three operations that move points:
///
/// - [`create_task_escrow`]: insert a task and debit its creator's reward
///   in one transaction (the escrow);
/// - [`settle_submission`]: decide a pending submission and, on approval,
///   credit the escrowed reward to the submitter; status flip, ledger
///   entry, balance update, task completion, and notification all commit or
///   roll back as a unit;
/// - [`withdraw`]: debit a withdrawal request.
///
/// A rejected submission moves no points and the escrowed reward is not
/// returned to the creator.
///
/// # Example
///
/// ```no_run
/// use taskexchange_shared::ledger;
/// use taskexchange_shared::models::task::CreateTask;
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, creator: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let task = ledger::create_task_escrow(&pool, CreateTask {
///     creator_id: creator,
///     title: "Sign up for ExampleApp".to_string(),
///     description: "Use my referral link and verify your email".to_string(),
///     referral_link: "https://example.com/ref/123".to_string(),
///     points_reward: 100,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::notification::Notification;
use crate::models::submission::{Submission, SubmissionStatus};
use crate::models::task::{CreateTask, Task};
use crate::models::transaction::TransactionKind;

/// Error type for ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A debit would take the balance below zero
    #[error("Insufficient points balance")]
    InsufficientPoints,

    /// Amount is zero, or its sign contradicts the entry kind
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// User has no profile row
    #[error("Profile not found for user {0}")]
    ProfileNotFound(Uuid),

    /// Submission does not exist
    #[error("Submission not found")]
    SubmissionNotFound,

    /// Submission was already decided
    #[error("Submission has already been decided")]
    AlreadyDecided,

    /// Task is no longer active (its reward was already settled)
    #[error("Task is no longer active")]
    TaskNotActive,

    /// Caller is neither the task creator nor a moderator
    #[error("Not authorized to decide this submission")]
    NotAuthorized,

    /// Underlying database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome of a submission decision
///
/// The notification has been written but not yet broadcast; the caller
/// pushes it to live subscribers after this function returns (i.e. after
/// the transaction committed).
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    /// The submission in its terminal state
    pub submission: Submission,

    /// Notification created for the submitter
    pub notification: Notification,

    /// Points credited to the submitter (0 on rejection)
    pub points_settled: i64,
}

/// Appends a ledger entry and adjusts the balance, atomically
///
/// Runs inside the caller's transaction so it composes with whatever else
/// must commit alongside the point movement. The balance update is
/// conditional (`points + amount >= 0`); a debit past zero affects no rows
/// and surfaces as [`LedgerError::InsufficientPoints`].
///
/// `amount` is signed and must match the kind: positive for `earned`,
/// negative for `spent`/`withdrawn`. Returns the new balance.
pub async fn post(
    tx: &mut SqlxTransaction<'_, Postgres>,
    user_id: Uuid,
    amount: i64,
    kind: TransactionKind,
    description: &str,
) -> Result<i64, LedgerError> {
    if amount == 0 {
        return Err(LedgerError::InvalidAmount(
            "Amount must be non-zero".to_string(),
        ));
    }
    if kind.is_credit() != (amount > 0) {
        return Err(LedgerError::InvalidAmount(format!(
            "A {} entry must be {}",
            kind.as_str(),
            if kind.is_credit() { "positive" } else { "negative" }
        )));
    }

    let new_balance: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE profiles
        SET points = points + $2,
            updated_at = NOW()
        WHERE user_id = $1 AND points + $2 >= 0
        RETURNING points
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(&mut **tx)
    .await?;

    let new_balance = match new_balance {
        Some((points,)) => points,
        None => {
            // Zero rows: either no profile, or the debit would overdraw
            let exists: Option<(i32,)> =
                sqlx::query_as("SELECT 1 FROM profiles WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await?;

            return Err(if exists.is_some() {
                LedgerError::InsufficientPoints
            } else {
                LedgerError::ProfileNotFound(user_id)
            });
        }
    };

    sqlx::query(
        r#"
        INSERT INTO transactions (user_id, amount, kind, description)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(kind)
    .bind(description)
    .execute(&mut **tx)
    .await?;

    debug!(
        user_id = %user_id,
        amount,
        kind = kind.as_str(),
        new_balance,
        "Ledger entry posted"
    );

    Ok(new_balance)
}

/// Creates a task and escrows its reward from the creator
///
/// One transaction: debit the creator by `points_reward` (with a `spent`
/// ledger entry) and insert the task. An insufficient balance aborts before
/// any write becomes visible.
pub async fn create_task_escrow(pool: &PgPool, data: CreateTask) -> Result<Task, LedgerError> {
    if data.points_reward < 1 {
        return Err(LedgerError::InvalidAmount(
            "Reward must be at least 1 point".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    post(
        &mut tx,
        data.creator_id,
        -data.points_reward,
        TransactionKind::Spent,
        &format!("Created task: {}", data.title),
    )
    .await?;

    let task = sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (creator_id, title, description, referral_link, points_reward)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, creator_id, title, description, referral_link,
                  points_reward, status, created_at, updated_at
        "#,
    )
    .bind(data.creator_id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(&data.referral_link)
    .bind(data.points_reward)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        task_id = %task.id,
        creator_id = %task.creator_id,
        points_reward = task.points_reward,
        "Task created, reward escrowed"
    );

    Ok(task)
}

/// Decides a pending submission and settles the escrowed reward
///
/// The whole decision is one database transaction:
///
/// 1. load the submission with its task for the authorization check;
/// 2. flip status pending→approved|rejected with a conditional update
///    (`WHERE status = 'pending'`), the one-way gate; a concurrent
///    decision makes this affect zero rows and the loser gets
///    [`LedgerError::AlreadyDecided`];
/// 3. on approval, complete the task (conditional on it still being
///    active) and credit the reward to the submitter via [`post`];
/// 4. insert the submitter's notification;
/// 5. commit; a failure at any step rolls everything back, so there is no
///    observable state where the status says approved but the balance was
///    not credited.
///
/// `decider_id`/`decider_is_moderator` identify the caller: the task's
/// creator and moderators may decide, nobody else.
pub async fn settle_submission(
    pool: &PgPool,
    submission_id: Uuid,
    approve: bool,
    decider_id: Uuid,
    decider_is_moderator: bool,
) -> Result<SettlementOutcome, LedgerError> {
    let mut tx = pool.begin().await?;

    let row: Option<(Uuid, Uuid, Uuid, String, i64, SubmissionStatus)> = sqlx::query_as(
        r#"
        SELECT s.task_id, s.submitter_id, t.creator_id, t.title, t.points_reward, s.status
        FROM task_submissions s
        JOIN tasks t ON t.id = s.task_id
        WHERE s.id = $1
        "#,
    )
    .bind(submission_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (task_id, submitter_id, creator_id, task_title, points_reward, status) =
        row.ok_or(LedgerError::SubmissionNotFound)?;

    if decider_id != creator_id && !decider_is_moderator {
        return Err(LedgerError::NotAuthorized);
    }

    if status.is_terminal() {
        return Err(LedgerError::AlreadyDecided);
    }

    let new_status = if approve {
        SubmissionStatus::Approved
    } else {
        SubmissionStatus::Rejected
    };

    // The one-way gate: only a pending row transitions
    let submission: Option<Submission> = sqlx::query_as(
        r#"
        UPDATE task_submissions
        SET status = $2,
            decided_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING id, task_id, submitter_id, proof_url, status, created_at, decided_at
        "#,
    )
    .bind(submission_id)
    .bind(new_status)
    .fetch_optional(&mut *tx)
    .await?;

    let submission = submission.ok_or(LedgerError::AlreadyDecided)?;

    let mut points_settled = 0;
    if approve {
        // A task pays out once; approving against a completed task fails
        // and the submission stays pending (the transaction rolls back)
        let completed = sqlx::query(
            r#"
            UPDATE tasks
            SET status = 'completed',
                updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(task_id)
        .execute(&mut *tx)
        .await?;

        if completed.rows_affected() == 0 {
            return Err(LedgerError::TaskNotActive);
        }

        post(
            &mut tx,
            submitter_id,
            points_reward,
            TransactionKind::Earned,
            &format!("Completed task: {}", task_title),
        )
        .await?;

        points_settled = points_reward;
    }

    let (title, message) = if approve {
        (
            "Submission approved".to_string(),
            format!(
                "Your submission for \"{}\" was approved. {} points were credited to your wallet.",
                task_title, points_reward
            ),
        )
    } else {
        (
            "Submission rejected".to_string(),
            format!("Your submission for \"{}\" was rejected.", task_title),
        )
    };

    let notification = sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (user_id, title, message)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, title, message, read, created_at
        "#,
    )
    .bind(submitter_id)
    .bind(&title)
    .bind(&message)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        submission_id = %submission_id,
        task_id = %task_id,
        submitter_id = %submitter_id,
        decider_id = %decider_id,
        approved = approve,
        points_settled,
        "Submission decided"
    );

    Ok(SettlementOutcome {
        submission,
        notification,
        points_settled,
    })
}

/// Records a withdrawal request, debiting the balance
///
/// Amount must be at least 1; an amount above the balance is rejected by
/// the conditional update in [`post`]. Returns the new balance.
pub async fn withdraw(pool: &PgPool, user_id: Uuid, amount: i64) -> Result<i64, LedgerError> {
    if amount < 1 {
        return Err(LedgerError::InvalidAmount(
            "Withdrawal amount must be at least 1 point".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let new_balance = post(
        &mut tx,
        user_id,
        -amount,
        TransactionKind::Withdrawn,
        "Points withdrawal request",
    )
    .await?;

    tx.commit().await?;

    info!(user_id = %user_id, amount, new_balance, "Withdrawal recorded");

    Ok(new_balance)
}

/// Result of a reconciliation check for one user
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Profile balance
    pub balance: i64,

    /// Sum of signed ledger entries
    pub ledger_sum: i64,

    /// When the check ran
    pub checked_at: DateTime<Utc>,
}

impl Reconciliation {
    /// Whether the balance matches the ledger
    pub fn is_consistent(&self) -> bool {
        self.balance == self.ledger_sum
    }
}

/// Verifies that a user's balance equals the sum of their ledger entries
///
/// Both values are read in one statement so the check cannot race a
/// concurrent settlement.
pub async fn reconcile(pool: &PgPool, user_id: Uuid) -> Result<Reconciliation, LedgerError> {
    let row: Option<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT p.points,
               COALESCE((SELECT SUM(amount) FROM transactions WHERE user_id = p.user_id), 0)::BIGINT
        FROM profiles p
        WHERE p.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let (balance, ledger_sum) = row.ok_or(LedgerError::ProfileNotFound(user_id))?;

    Ok(Reconciliation {
        balance,
        ledger_sum,
        checked_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconciliation_consistency() {
        let ok = Reconciliation {
            balance: 400,
            ledger_sum: 400,
            checked_at: Utc::now(),
        };
        assert!(ok.is_consistent());

        let drifted = Reconciliation {
            balance: 400,
            ledger_sum: 500,
            checked_at: Utc::now(),
        };
        assert!(!drifted.is_consistent());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            LedgerError::InsufficientPoints.to_string(),
            "Insufficient points balance"
        );
        assert_eq!(
            LedgerError::AlreadyDecided.to_string(),
            "Submission has already been decided"
        );
    }

    // Transactional behavior (escrow, settlement, withdrawal) requires a
    // database; see tests/ledger_tests.rs
}
