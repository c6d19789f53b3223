/// Wallet endpoints
///
/// - `GET /v1/wallet` - Balance and full transaction history
/// - `POST /v1/wallet/withdraw` - Record a withdrawal request
///
/// The wallet view issues its two reads concurrently (fire-and-wait-all);
/// they target disjoint data so ordering between them is irrelevant.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use taskexchange_shared::{
    auth::middleware::AuthContext,
    ledger,
    models::{profile::Profile, transaction::Transaction},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Wallet view response
#[derive(Debug, Serialize)]
pub struct WalletResponse {
    /// Current point balance
    pub balance: i64,

    /// Full transaction history, newest first
    pub transactions: Vec<Transaction>,
}

/// Withdraw request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WithdrawRequest {
    /// Points to withdraw (1..=balance)
    #[validate(range(min = 1, message = "Withdrawal amount must be at least 1 point"))]
    pub amount: i64,
}

/// Withdraw response
#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    /// Balance after the withdrawal
    pub balance: i64,

    /// Amount withdrawn
    pub amount: i64,
}

/// Wallet view: balance plus transaction history
pub async fn wallet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<WalletResponse>> {
    let (profile, transactions) = tokio::try_join!(
        Profile::find_by_user_id(&state.db, auth.user_id),
        Transaction::list_by_user(&state.db, auth.user_id),
    )?;

    let profile = profile.ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(WalletResponse {
        balance: profile.points,
        transactions,
    }))
}

/// Records a withdrawal request, debiting the balance
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Amount below 1 or above the balance
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<WithdrawRequest>,
) -> ApiResult<Json<WithdrawResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let balance = ledger::withdraw(&state.db, auth.user_id, req.amount).await?;

    Ok(Json(WithdrawResponse {
        balance,
        amount: req.amount,
    }))
}
