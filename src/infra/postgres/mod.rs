//! PostgreSQL store implementations.
//!
//! Production storage for accounts, the vote ledger, and the voting-status
//! singleton.

mod status_store;
mod user_store;
mod vote_store;

pub use status_store::*;
pub use user_store::*;
pub use vote_store::*;
