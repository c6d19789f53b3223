/// Profile model and database operations
///
/// Profiles carry everything the marketplace knows about a user beyond the
/// auth identity: username, point balance, role, and display preferences.
/// A profile is created at sign-up and lazily ensured at sign-in, so a user
/// row without a profile never survives a login.
///
/// The `points` column is mutated exclusively through
/// [`ledger::post`](crate::ledger::post); nothing else in the codebase
/// writes it. The non-negative invariant is enforced there with a
/// conditional update (and backstopped by a CHECK constraint), never by a
/// prior read.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE profile_role AS ENUM ('user', 'moderator');
///
/// CREATE TABLE profiles (
///     user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
///     username VARCHAR(64) NOT NULL UNIQUE,
///     points BIGINT NOT NULL DEFAULT 0 CHECK (points >= 0),
///     role profile_role NOT NULL DEFAULT 'user',
///     dark_mode BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Marketplace roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "profile_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    /// Regular user: creates tasks, submits proofs, decides submissions on
    /// own tasks
    User,

    /// Moderator: additionally decides any pending submission
    Moderator,
}

impl ProfileRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileRole::User => "user",
            ProfileRole::Moderator => "moderator",
        }
    }
}

/// Profile model representing a user's marketplace identity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    /// Owning user (1:1 with users.id)
    pub user_id: Uuid,

    /// Public display name, unique across the marketplace
    pub username: String,

    /// Current point balance (non-negative)
    pub points: i64,

    /// Marketplace role
    pub role: ProfileRole,

    /// Dark theme preference
    pub dark_mode: bool,

    /// When the profile was created
    pub created_at: DateTime<Utc>,

    /// When the profile was last updated
    pub updated_at: DateTime<Utc>,
}

/// Derives a username from an email address
///
/// Takes the local part lowercased: "Alice@example.com" → "alice".
pub fn username_from_email(email: &str) -> String {
    email
        .split('@')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("user")
        .to_lowercase()
}

impl Profile {
    /// Creates a profile for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the username is taken (unique constraint) or the
    /// user already has a profile.
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        username: &str,
    ) -> Result<Self, sqlx::Error> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, username)
            VALUES ($1, $2)
            RETURNING user_id, username, points, role, dark_mode, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(username)
        .fetch_one(pool)
        .await?;

        Ok(profile)
    }

    /// Ensures a profile exists for a user, creating it if absent
    ///
    /// Sign-in calls this so accounts that predate the profiles table (or
    /// whose sign-up was interrupted) get a profile on their next login.
    /// An existing profile is returned untouched.
    pub async fn ensure(
        pool: &PgPool,
        user_id: Uuid,
        username: &str,
    ) -> Result<Self, sqlx::Error> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, username)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = profiles.updated_at
            RETURNING user_id, username, points, role, dark_mode, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(username)
        .fetch_one(pool)
        .await?;

        Ok(profile)
    }

    /// Finds a profile by its owning user ID
    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, username, points, role, dark_mode, created_at, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// Finds a profile by username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, username, points, role, dark_mode, created_at, updated_at
            FROM profiles
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// Toggles the dark theme preference, returning the updated profile
    pub async fn toggle_dark_mode(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET dark_mode = NOT dark_mode,
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING user_id, username, points, role, dark_mode, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }
}
