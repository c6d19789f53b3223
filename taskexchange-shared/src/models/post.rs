/// Post model and database operations
///
/// Community posts: free-form announcements visible to every signed-in user.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE posts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     content TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Post model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    /// Unique post ID
    pub id: Uuid,

    /// Author
    pub author_id: Uuid,

    /// Post title
    pub title: String,

    /// Post body
    pub content: String,

    /// When the post was created
    pub created_at: DateTime<Utc>,
}

/// Post row joined with its author's username, for listings
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostWithAuthor {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,

    /// Author's profile username
    pub author_username: String,
}

impl Post {
    /// Creates a new post
    pub async fn create(
        pool: &PgPool,
        author_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Self, sqlx::Error> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (author_id, title, content)
            VALUES ($1, $2, $3)
            RETURNING id, author_id, title, content, created_at
            "#,
        )
        .bind(author_id)
        .bind(title)
        .bind(content)
        .fetch_one(pool)
        .await?;

        Ok(post)
    }

    /// Lists all posts with author usernames, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<PostWithAuthor>, sqlx::Error> {
        let posts = sqlx::query_as::<_, PostWithAuthor>(
            r#"
            SELECT po.id, po.author_id, po.title, po.content, po.created_at,
                   p.username AS author_username
            FROM posts po
            JOIN profiles p ON p.user_id = po.author_id
            ORDER BY po.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(posts)
    }
}
