//! # kampus-store
//!
//! Persistence for the campus marketplace, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for users, listings,
//! messages, ratings and reports, plus the read-side conversation projection.
//! Helpers perform single statements; nothing here opens a transaction.

pub mod columns;
pub mod conversations;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod products;
pub mod query;
pub mod ratings;
pub mod reports;
pub mod stats;
pub mod users;

mod error;

pub use conversations::{Conversation, LastMessage};
pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
pub use stats::{GroupCount, RatingStats, UserStats};
