/// Authentication context for Axum requests
///
/// The API server validates the `Authorization: Bearer <token>` header in a
/// middleware layer and injects an `AuthContext` into request extensions.
/// Handlers extract it with Axum's `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskexchange_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::profile::ProfileRole;

/// Authentication context added to request extensions
///
/// Present on every request that passed the JWT middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Marketplace role carried by the token
    pub role: ProfileRole,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_jwt(user_id: Uuid, role: ProfileRole) -> Self {
        Self { user_id, role }
    }

    /// Whether the authenticated user holds moderator privilege
    pub fn is_moderator(&self) -> bool {
        self.role == ProfileRole::Moderator
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_context_from_jwt() {
        let user_id = Uuid::new_v4();
        let ctx = AuthContext::from_jwt(user_id, ProfileRole::User);

        assert_eq!(ctx.user_id, user_id);
        assert!(!ctx.is_moderator());
    }

    #[test]
    fn test_moderator_context() {
        let ctx = AuthContext::from_jwt(Uuid::new_v4(), ProfileRole::Moderator);
        assert!(ctx.is_moderator());
    }
}
