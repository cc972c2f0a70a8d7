//! Store layer for the book poll.
//!
//! Contains trait definitions and implementations for:
//! - Account storage
//! - The append-only vote ledger (single vote per user)
//! - The voting-status singleton (single-row, partial updates)
//!
//! PostgreSQL backs production; the in-memory stores back tests and
//! DB-less development.

mod error;
mod memory;
pub mod postgres;
mod traits;

pub use error::*;
pub use memory::{InMemoryStatusStore, InMemoryUserStore, InMemoryVoteStore};
pub use postgres::{PgStatusStore, PgUserStore, PgVoteStore};
pub use traits::*;
