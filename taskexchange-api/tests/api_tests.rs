/// Integration tests for the Task Exchange API
///
/// These tests drive the full router against a real database
/// (DATABASE_URL must point at a test database; JWT_SECRET must be set):
///
/// - auth gating of protected routes
/// - registration creating a profile
/// - task creation with escrow debit
/// - the submission decision and point settlement
/// - wallet withdrawal bounds
/// - the ledger reconciliation invariant

mod common;

use axum::http::StatusCode;
use common::TestContext;
use taskexchange_shared::ledger;
use taskexchange_shared::models::profile::{Profile, ProfileRole};
use taskexchange_shared::models::submission::{Submission, SubmissionStatus};
use taskexchange_shared::models::task::{Task, TaskStatus};
use taskexchange_shared::models::transaction::{Transaction, TransactionKind};
use serde_json::json;
use uuid::Uuid;

/// Creates a task through the API and returns its id
async fn create_task_via_api(
    ctx: &TestContext,
    token: &str,
    title: &str,
    reward: i64,
) -> Uuid {
    let (status, body) = common::post(
        &ctx.app,
        "/v1/tasks",
        Some(token),
        json!({
            "title": title,
            "description": "Use the referral link and verify your email",
            "referral_link": "https://example.com/ref/123",
            "points_reward": reward
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "create task failed: {}", body);
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

/// Submits proof through the API and returns the submission id
async fn submit_proof_via_api(ctx: &TestContext, token: &str, task_id: Uuid) -> Uuid {
    let (status, body) = common::post(
        &ctx.app,
        &format!("/v1/tasks/{}/submissions", task_id),
        Some(token),
        json!({ "proof_url": "https://example.com/screenshot.png" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "submit proof failed: {}", body);
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = common::get(&ctx.app, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_unauthenticated_request_rejected() {
    let ctx = TestContext::new().await.unwrap();

    // The wallet (and every other protected route) requires a token
    let (status, _) = common::get(&ctx.app, "/v1/wallet", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::get(&ctx.app, "/v1/dashboard", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::get(&ctx.app, "/v1/tasks", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_creates_profile_with_derived_username() {
    let ctx = TestContext::new().await.unwrap();

    let local_part = format!("alice-{}", Uuid::new_v4().simple());
    let email = format!("{}@example.com", local_part);

    let (status, body) = common::post(
        &ctx.app,
        "/v1/auth/register",
        None,
        json!({ "email": email, "password": "SecureP4ss" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "register failed: {}", body);
    assert_eq!(body["username"], local_part);

    // The new profile starts with zero points
    let token = body["access_token"].as_str().unwrap();
    let (status, profile) = common::get(&ctx.app, "/v1/profile", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["points"], 0);
    assert_eq!(profile["role"], "user");

    // Cleanup the registered user directly
    let user_id = Uuid::parse_str(body["user_id"].as_str().unwrap()).unwrap();
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&ctx.db)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_register_weak_password_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = common::post(
        &ctx.app,
        "/v1/auth/register",
        None,
        json!({
            "email": format!("weak-{}@example.com", Uuid::new_v4()),
            "password": "alllowercase"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_task_creation_escrows_reward() {
    let mut ctx = TestContext::new().await.unwrap();
    let creator = ctx.create_user(ProfileRole::User, 500).await.unwrap();

    create_task_via_api(&ctx, &creator.token, "Escrow test task", 100).await;

    // Balance 500 → 400
    let profile = Profile::find_by_user_id(&ctx.db, creator.user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.points, 400);

    // Exactly one "spent" entry of -100 (plus the seed credit)
    let transactions = Transaction::list_by_user(&ctx.db, creator.user.id)
        .await
        .unwrap();
    let spent: Vec<_> = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Spent)
        .collect();
    assert_eq!(spent.len(), 1);
    assert_eq!(spent[0].amount, -100);

    // Balance reconciles with the ledger
    let check = ledger::reconcile(&ctx.db, creator.user.id).await.unwrap();
    assert!(check.is_consistent());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_task_creation_insufficient_balance() {
    let mut ctx = TestContext::new().await.unwrap();
    let creator = ctx.create_user(ProfileRole::User, 50).await.unwrap();

    let (status, body) = common::post(
        &ctx.app,
        "/v1/tasks",
        Some(&creator.token),
        json!({
            "title": "Too expensive",
            "description": "Reward exceeds balance",
            "referral_link": "https://example.com/ref/123",
            "points_reward": 100
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);

    // Aborted before any write: balance unchanged, no spent entry
    let profile = Profile::find_by_user_id(&ctx.db, creator.user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.points, 50);

    let transactions = Transaction::list_by_user(&ctx.db, creator.user.id)
        .await
        .unwrap();
    assert!(transactions
        .iter()
        .all(|t| t.kind != TransactionKind::Spent));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_nonpositive_reward_rejected() {
    let mut ctx = TestContext::new().await.unwrap();
    let creator = ctx.create_user(ProfileRole::User, 500).await.unwrap();

    let (status, _) = common::post(
        &ctx.app,
        "/v1/tasks",
        Some(&creator.token),
        json!({
            "title": "Free work",
            "description": "No reward",
            "referral_link": "https://example.com/ref/123",
            "points_reward": 0
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_approval_settles_reward() {
    let mut ctx = TestContext::new().await.unwrap();
    let creator = ctx.create_user(ProfileRole::User, 500).await.unwrap();
    let submitter = ctx.create_user(ProfileRole::User, 0).await.unwrap();

    let task_id = create_task_via_api(&ctx, &creator.token, "Settlement test", 100).await;
    let submission_id = submit_proof_via_api(&ctx, &submitter.token, task_id).await;

    // Submission starts pending
    let submission = Submission::find_by_id(&ctx.db, submission_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Pending);

    // Creator approves
    let (status, body) = common::post(
        &ctx.app,
        &format!("/v1/submissions/{}/decide", submission_id),
        Some(&creator.token),
        json!({ "approve": true }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["points_settled"], 100);

    // Submitter gained exactly one "earned" entry of +100
    let transactions = Transaction::list_by_user(&ctx.db, submitter.user.id)
        .await
        .unwrap();
    let earned: Vec<_> = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Earned)
        .collect();
    assert_eq!(earned.len(), 1);
    assert_eq!(earned[0].amount, 100);

    let profile = Profile::find_by_user_id(&ctx.db, submitter.user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.points, 100);

    // The task completed
    let task = Task::find_by_id(&ctx.db, task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);

    // Both parties reconcile
    assert!(ledger::reconcile(&ctx.db, creator.user.id)
        .await
        .unwrap()
        .is_consistent());
    assert!(ledger::reconcile(&ctx.db, submitter.user.id)
        .await
        .unwrap()
        .is_consistent());

    // A second decision is rejected and changes nothing
    let (status, _) = common::post(
        &ctx.app,
        &format!("/v1/submissions/{}/decide", submission_id),
        Some(&creator.token),
        json!({ "approve": false }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let profile = Profile::find_by_user_id(&ctx.db, submitter.user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.points, 100);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_rejection_moves_no_points() {
    let mut ctx = TestContext::new().await.unwrap();
    let creator = ctx.create_user(ProfileRole::User, 500).await.unwrap();
    let submitter = ctx.create_user(ProfileRole::User, 0).await.unwrap();

    let task_id = create_task_via_api(&ctx, &creator.token, "Rejection test", 100).await;
    let submission_id = submit_proof_via_api(&ctx, &submitter.token, task_id).await;

    let (status, body) = common::post(
        &ctx.app,
        &format!("/v1/submissions/{}/decide", submission_id),
        Some(&creator.token),
        json!({ "approve": false }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["points_settled"], 0);

    // No transaction for the submitter, balance unchanged
    let transactions = Transaction::list_by_user(&ctx.db, submitter.user.id)
        .await
        .unwrap();
    assert!(transactions.is_empty());

    let profile = Profile::find_by_user_id(&ctx.db, submitter.user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.points, 0);

    // No refund for the creator either: the escrow stands
    let profile = Profile::find_by_user_id(&ctx.db, creator.user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.points, 400);

    // The task stays active
    let task = Task::find_by_id(&ctx.db, task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Active);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_moderator_can_decide() {
    let mut ctx = TestContext::new().await.unwrap();
    let creator = ctx.create_user(ProfileRole::User, 500).await.unwrap();
    let submitter = ctx.create_user(ProfileRole::User, 0).await.unwrap();
    let moderator = ctx.create_user(ProfileRole::Moderator, 0).await.unwrap();

    let task_id = create_task_via_api(&ctx, &creator.token, "Moderated task", 50).await;
    let submission_id = submit_proof_via_api(&ctx, &submitter.token, task_id).await;

    let (status, body) = common::post(
        &ctx.app,
        &format!("/v1/submissions/{}/decide", submission_id),
        Some(&moderator.token),
        json!({ "approve": true }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);

    let profile = Profile::find_by_user_id(&ctx.db, submitter.user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.points, 50);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_unrelated_user_cannot_decide() {
    let mut ctx = TestContext::new().await.unwrap();
    let creator = ctx.create_user(ProfileRole::User, 500).await.unwrap();
    let submitter = ctx.create_user(ProfileRole::User, 0).await.unwrap();
    let bystander = ctx.create_user(ProfileRole::User, 0).await.unwrap();

    let task_id = create_task_via_api(&ctx, &creator.token, "Protected task", 50).await;
    let submission_id = submit_proof_via_api(&ctx, &submitter.token, task_id).await;

    let (status, _) = common::post(
        &ctx.app,
        &format!("/v1/submissions/{}/decide", submission_id),
        Some(&bystander.token),
        json!({ "approve": true }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);

    // Still pending
    let submission = Submission::find_by_id(&ctx.db, submission_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Pending);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_creator_cannot_submit_own_task() {
    let mut ctx = TestContext::new().await.unwrap();
    let creator = ctx.create_user(ProfileRole::User, 500).await.unwrap();

    let task_id = create_task_via_api(&ctx, &creator.token, "Self-dealing", 50).await;

    let (status, _) = common::post(
        &ctx.app,
        &format!("/v1/tasks/{}/submissions", task_id),
        Some(&creator.token),
        json!({ "proof_url": "https://example.com/proof.png" }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_decide_missing_submission_not_found() {
    let mut ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(ProfileRole::User, 0).await.unwrap();

    let (status, _) = common::post(
        &ctx.app,
        &format!("/v1/submissions/{}/decide", Uuid::new_v4()),
        Some(&user.token),
        json!({ "approve": true }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_withdraw_bounds() {
    let mut ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(ProfileRole::User, 100).await.unwrap();

    // Zero is rejected before any write
    let (status, _) = common::post(
        &ctx.app,
        "/v1/wallet/withdraw",
        Some(&user.token),
        json!({ "amount": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // More than the balance is rejected
    let (status, _) = common::post(
        &ctx.app,
        "/v1/wallet/withdraw",
        Some(&user.token),
        json!({ "amount": 150 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // The full balance is allowed
    let (status, body) = common::post(
        &ctx.app,
        "/v1/wallet/withdraw",
        Some(&user.token),
        json!({ "amount": 100 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["balance"], 0);

    // One "withdrawn" entry of -100, and the ledger reconciles
    let transactions = Transaction::list_by_user(&ctx.db, user.user.id)
        .await
        .unwrap();
    let withdrawn: Vec<_> = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Withdrawn)
        .collect();
    assert_eq!(withdrawn.len(), 1);
    assert_eq!(withdrawn[0].amount, -100);

    assert!(ledger::reconcile(&ctx.db, user.user.id)
        .await
        .unwrap()
        .is_consistent());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_wallet_view() {
    let mut ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(ProfileRole::User, 250).await.unwrap();

    let (status, body) = common::get(&ctx.app, "/v1/wallet", Some(&user.token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], user.profile.points);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 1); // the seed credit

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_dashboard_stats() {
    let mut ctx = TestContext::new().await.unwrap();
    let creator = ctx.create_user(ProfileRole::User, 500).await.unwrap();
    let submitter = ctx.create_user(ProfileRole::User, 0).await.unwrap();

    let task_id = create_task_via_api(&ctx, &creator.token, "Dashboard task", 100).await;
    submit_proof_via_api(&ctx, &submitter.token, task_id).await;

    let (status, body) = common::get(&ctx.app, "/v1/dashboard", Some(&creator.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_points"], 400);
    assert_eq!(body["tasks_created"], 1);

    let (status, body) = common::get(&ctx.app, "/v1/dashboard", Some(&submitter.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pending_submissions"], 1);
    assert_eq!(body["tasks_completed"], 0);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_pending_queue_scoping() {
    let mut ctx = TestContext::new().await.unwrap();
    let creator = ctx.create_user(ProfileRole::User, 500).await.unwrap();
    let submitter = ctx.create_user(ProfileRole::User, 0).await.unwrap();
    let bystander = ctx.create_user(ProfileRole::User, 0).await.unwrap();

    let task_id = create_task_via_api(&ctx, &creator.token, "Queue task", 50).await;
    let submission_id = submit_proof_via_api(&ctx, &submitter.token, task_id).await;

    // The creator sees the pending submission on their task
    let (status, body) =
        common::get(&ctx.app, "/v1/submissions/pending", Some(&creator.token)).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["submissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&submission_id.to_string().as_str()));

    // A bystander's queue does not include it
    let (status, body) =
        common::get(&ctx.app, "/v1/submissions/pending", Some(&bystander.token)).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["submissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert!(!ids.contains(&submission_id.to_string().as_str()));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_approval_creates_notification() {
    let mut ctx = TestContext::new().await.unwrap();
    let creator = ctx.create_user(ProfileRole::User, 500).await.unwrap();
    let submitter = ctx.create_user(ProfileRole::User, 0).await.unwrap();

    let task_id = create_task_via_api(&ctx, &creator.token, "Notify me", 75).await;
    let submission_id = submit_proof_via_api(&ctx, &submitter.token, task_id).await;

    let (status, _) = common::post(
        &ctx.app,
        &format!("/v1/submissions/{}/decide", submission_id),
        Some(&creator.token),
        json!({ "approve": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = common::get(&ctx.app, "/v1/notifications", Some(&submitter.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread"], 1);

    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["title"], "Submission approved");
    let notification_id = notifications[0]["id"].as_str().unwrap();

    // Mark it read
    let (status, body) = common::post(
        &ctx.app,
        &format!("/v1/notifications/{}/read", notification_id),
        Some(&submitter.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], true);

    // Another user cannot flip someone else's notification
    let (status, _) = common::post(
        &ctx.app,
        &format!("/v1/notifications/{}/read", notification_id),
        Some(&creator.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_posts_roundtrip() {
    let mut ctx = TestContext::new().await.unwrap();
    let author = ctx.create_user(ProfileRole::User, 0).await.unwrap();

    let (status, body) = common::post(
        &ctx.app,
        "/v1/posts",
        Some(&author.token),
        json!({ "title": "Welcome", "content": "Introduce yourself here." }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let post_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = common::get(&ctx.app, "/v1/posts", Some(&author.token)).await;
    assert_eq!(status, StatusCode::OK);
    let posts = body["posts"].as_array().unwrap();
    assert!(posts.iter().any(|p| p["id"] == post_id.as_str()));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_theme_toggle() {
    let mut ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user(ProfileRole::User, 0).await.unwrap();

    let (status, body) = common::post(
        &ctx.app,
        "/v1/profile/theme",
        Some(&user.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dark_mode"], true);

    let (status, body) = common::post(
        &ctx.app,
        "/v1/profile/theme",
        Some(&user.token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dark_mode"], false);

    ctx.cleanup().await.unwrap();
}
