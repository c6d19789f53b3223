/// Authentication and authorization utilities
///
/// This module provides everything the API server needs to authenticate
/// requests:
///
/// - `password`: Argon2id password hashing and verification
/// - `jwt`: JWT token generation and validation (access + refresh)
/// - `middleware`: Axum request authentication context
///
/// # Authentication Flow
///
/// 1. User registers or logs in with email/password
/// 2. Server verifies password against Argon2id hash
/// 3. Server issues JWT access token (24h) and refresh token (30d)
/// 4. Client includes access token in `Authorization: Bearer <token>` header
/// 5. Middleware validates the token and injects `AuthContext`

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{create_token, validate_access_token, Claims, TokenType};
pub use middleware::AuthContext;
pub use password::{hash_password, verify_password};
