/// Database layer
///
/// This module provides database connectivity for Task Exchange:
///
/// - `pool`: PostgreSQL connection pool management
/// - `migrations`: Migration runner using sqlx's embedded migrations

pub mod migrations;
pub mod pool;

pub use pool::{create_pool, DatabaseConfig};
