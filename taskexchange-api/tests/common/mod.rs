/// Common test utilities for integration tests
///
/// Shared infrastructure for the API integration tests:
/// - Test database setup and per-context cleanup
/// - Test user/profile creation with seeded balances
/// - JWT token generation
/// - Request/response helpers

use axum::body::Body;
use axum::http::{Request, StatusCode};
use taskexchange_api::app::{build_router, AppState};
use taskexchange_api::config::Config;
use taskexchange_shared::auth::jwt::{create_token, Claims, TokenType};
use taskexchange_shared::ledger;
use taskexchange_shared::models::profile::{Profile, ProfileRole};
use taskexchange_shared::models::transaction::TransactionKind;
use taskexchange_shared::models::user::{CreateUser, User};
use sqlx::PgPool;
use tower::ServiceExt as _;
use uuid::Uuid;

/// A test user with its profile and access token
pub struct TestUser {
    pub user: User,
    pub profile: Profile,
    pub token: String,
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    created_users: Vec<Uuid>,
}

impl TestContext {
    /// Creates a new test context against the DATABASE_URL database
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../taskexchange-shared/migrations")
            .run(&db)
            .await?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            created_users: Vec::new(),
        })
    }

    /// Creates a test user with a profile, a seeded balance, and a token
    pub async fn create_user(
        &mut self,
        role: ProfileRole,
        points: i64,
    ) -> anyhow::Result<TestUser> {
        let email = format!("test-{}@example.com", Uuid::new_v4());
        let username = email.split('@').next().unwrap().to_string();

        let user = User::create(
            &self.db,
            CreateUser {
                email,
                password_hash: "test_hash".to_string(), // Login is not exercised here
            },
        )
        .await?;

        let mut profile = Profile::create(&self.db, user.id, &username).await?;

        if role == ProfileRole::Moderator {
            sqlx::query("UPDATE profiles SET role = 'moderator' WHERE user_id = $1")
                .bind(user.id)
                .execute(&self.db)
                .await?;
            profile.role = ProfileRole::Moderator;
        }

        if points > 0 {
            seed_points(&self.db, user.id, points).await?;
            profile.points = points;
        }

        let claims = Claims::new(user.id, role, TokenType::Access);
        let token = create_token(&claims, &self.config.jwt.secret)?;

        self.created_users.push(user.id);

        Ok(TestUser {
            user,
            profile,
            token,
        })
    }

    /// Cleans up all users created through this context (cascades to
    /// profiles, tasks, submissions, transactions, notifications, posts)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        for user_id in &self.created_users {
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(&self.db)
                .await?;
        }
        Ok(())
    }
}

/// Seeds a balance through the ledger so the reconciliation invariant holds
/// for test users too
pub async fn seed_points(db: &PgPool, user_id: Uuid, amount: i64) -> anyhow::Result<()> {
    let mut tx = db.begin().await?;
    ledger::post(
        &mut tx,
        user_id,
        amount,
        TransactionKind::Earned,
        "Test seed credit",
    )
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Sends a GET request with optional auth, returning status and JSON body
pub async fn get(
    app: &axum::Router,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder.body(Body::empty()).unwrap();

    send(app, request).await
}

/// Sends a POST request with a JSON body and optional auth
pub async fn post(
    app: &axum::Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    send(app, request).await
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}
