/// Transaction (ledger entry) model and database operations
///
/// The ledger is the append-only record of every point movement. Rows are
/// only ever inserted, by [`ledger::post`](crate::ledger::post) inside the
/// same database transaction that adjusts the profile balance, and never
/// updated or deleted.
///
/// Amounts are signed: `earned` entries are positive, `spent` and
/// `withdrawn` entries are negative. The reconciliation invariant is that
/// `SUM(amount)` over a user's entries always equals their profile balance.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE transaction_kind AS ENUM ('earned', 'spent', 'withdrawn');
///
/// CREATE TABLE transactions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     amount BIGINT NOT NULL,
///     kind transaction_kind NOT NULL,
///     description TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Kind of point movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Points credited for an approved submission
    Earned,

    /// Points escrowed when creating a task
    Spent,

    /// Points removed by a withdrawal request
    Withdrawn,
}

impl TransactionKind {
    /// Converts kind to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Earned => "earned",
            TransactionKind::Spent => "spent",
            TransactionKind::Withdrawn => "withdrawn",
        }
    }

    /// Whether this kind credits (true) or debits (false) the balance
    ///
    /// Determines the sign the ledger accepts for an entry of this kind.
    pub fn is_credit(&self) -> bool {
        matches!(self, TransactionKind::Earned)
    }
}

/// Ledger entry: one signed point movement for one user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    /// Unique entry ID
    pub id: Uuid,

    /// User whose balance moved
    pub user_id: Uuid,

    /// Signed amount (positive for earned, negative for spent/withdrawn)
    pub amount: i64,

    /// Kind of movement
    pub kind: TransactionKind,

    /// Human-readable description (e.g. "Created task: Sign up for X")
    pub description: String,

    /// When the entry was appended
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Lists all of a user's ledger entries, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, amount, kind, description, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(transactions)
    }

    /// Lists a user's most recent ledger entries
    pub async fn recent_by_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, amount, kind, description, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(transactions)
    }

    /// Sums a user's signed ledger entries
    ///
    /// Must equal the profile balance at all times; used by tests and
    /// reconciliation checks.
    pub async fn sum_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (sum,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM transactions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(sum)
    }
}
