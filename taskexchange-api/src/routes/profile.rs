/// Profile endpoints
///
/// - `GET /v1/profile` - The caller's profile
/// - `POST /v1/profile/theme` - Toggle the dark theme preference

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use taskexchange_shared::{auth::middleware::AuthContext, models::profile::Profile};

/// Fetches the caller's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Profile>> {
    let profile = Profile::find_by_user_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(profile))
}

/// Toggles the caller's dark theme preference, returning the updated profile
pub async fn toggle_theme(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Profile>> {
    let profile = Profile::toggle_dark_mode(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(profile))
}
