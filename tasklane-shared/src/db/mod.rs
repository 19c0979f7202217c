//! Database layer for Tasklane
//!
//! - `pool`: PostgreSQL connection pool management with health checks
//! - `migrations`: embedded migration runner
//!
//! Queries themselves live in [`crate::store::postgres`].

pub mod migrations;
pub mod pool;
