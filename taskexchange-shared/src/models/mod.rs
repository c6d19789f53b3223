/// Database models for Task Exchange
///
/// This module contains all database models and their SQL operations.
///
/// # Models
///
/// - `user`: Auth identities (email + password hash)
/// - `profile`: Marketplace profiles (username, point balance, role)
/// - `task`: Referral tasks offering escrowed point rewards
/// - `submission`: Proof-of-completion claims with a one-way decision gate
/// - `transaction`: Append-only signed point ledger
/// - `notification`: Per-user messages created on submission decisions
/// - `post`: Community posts

pub mod notification;
pub mod post;
pub mod profile;
pub mod submission;
pub mod task;
pub mod transaction;
pub mod user;
