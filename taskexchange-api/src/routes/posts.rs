/// Community post endpoints
///
/// - `GET /v1/posts` - List all posts with author names
/// - `POST /v1/posts` - Create a post

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use taskexchange_shared::{
    auth::middleware::AuthContext,
    models::post::{Post, PostWithAuthor},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Create post request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostRequest {
    /// Post title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Post body
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

/// Post list response
#[derive(Debug, Serialize)]
pub struct PostsResponse {
    /// All posts, newest first
    pub posts: Vec<PostWithAuthor>,
}

/// Lists all posts, newest first
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<PostsResponse>> {
    let posts = Post::list(&state.db).await?;

    Ok(Json(PostsResponse { posts }))
}

/// Creates a post
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<Json<Post>> {
    req.validate().map_err(ApiError::from_validation)?;

    let post = Post::create(&state.db, auth.user_id, &req.title, &req.content).await?;

    Ok(Json(post))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_post_request_validation() {
        let valid = CreatePostRequest {
            title: "Welcome".to_string(),
            content: "First post!".to_string(),
        };
        assert!(valid.validate().is_ok());

        let empty_title = CreatePostRequest {
            title: "".to_string(),
            content: "body".to_string(),
        };
        assert!(empty_title.validate().is_err());
    }
}
