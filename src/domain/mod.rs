//! Domain models for the book poll.
//!
//! Accounts, ledger entries, the fixed ballot, and the voting-status
//! singleton with its partial-update form.

mod status;
mod types;
mod user;
mod vote;

pub use status::*;
pub use types::*;
pub use user::*;
pub use vote::*;
