//! Database models for Tasklane
//!
//! Plain data structs with no persistence behavior of their own; reads and
//! writes go through the repositories in [`crate::store`].
//!
//! # Models
//!
//! - `user`: User accounts (credentials stored as Argon2id hashes)
//! - `task`: To-do items, their visibility flags, and the derived views

pub mod task;
pub mod user;
