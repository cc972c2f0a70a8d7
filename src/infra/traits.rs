//! Trait definitions for the poll's core stores.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::{
    BookTitle, NewUser, StatusUpdate, User, UserId, Vote, VoteRecord, VotingStatus,
};

use super::Result;

/// Account storage.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an account.
    ///
    /// Fails with `DuplicateUser` when the username or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Look up an account by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Look up an account by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;

    /// Grant or revoke the admin flag. Returns false when no such user exists.
    async fn set_admin(&self, username: &str, is_admin: bool) -> Result<bool>;
}

/// Append-only vote ledger.
///
/// Invariant: at most one vote per user, enforced at write time. No update
/// or delete operation exists.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Append a vote.
    ///
    /// - Fails with `VotingClosed` when voting is inactive, regardless of
    ///   prior vote state (this check runs before the duplicate check).
    /// - Fails with `AlreadyVoted` when the user already has a ledger entry.
    ///   The check-then-insert is atomic with respect to concurrent requests
    ///   from the same user.
    async fn cast_vote(&self, user_id: UserId, book: &BookTitle) -> Result<Vote>;

    /// All ledger entries in insertion order, with voter usernames.
    async fn list_votes(&self) -> Result<Vec<VoteRecord>>;
}

/// The voting-status singleton.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Current status; creates the inactive/hidden row when missing.
    async fn get_status(&self) -> Result<VotingStatus>;

    /// Partial update. Unspecified fields are preserved; `last_updated`
    /// advances when at least one field is specified.
    async fn set_status(&self, update: StatusUpdate) -> Result<VotingStatus>;
}
