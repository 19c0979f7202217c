//! API route handlers
//!
//! - `health`: Health check endpoint
//! - `auth`: Account endpoints (register, login, logout)
//! - `tasks`: Task views and lifecycle endpoints

pub mod auth;
pub mod health;
pub mod tasks;
