/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh)
/// - `dashboard`: Per-user stats overview
/// - `profile`: Profile view and theme preference
/// - `tasks`: Task listing, creation (with escrow), proof submission
/// - `submissions`: Review queue and the settlement decision
/// - `wallet`: Balance, transaction history, withdrawal
/// - `notifications`: List, mark-read, and SSE live tail
/// - `posts`: Community posts

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod notifications;
pub mod posts;
pub mod profile;
pub mod submissions;
pub mod tasks;
pub mod wallet;
