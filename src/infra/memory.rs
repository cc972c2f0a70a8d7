//! In-memory store implementations.
//!
//! Back the same traits as the PostgreSQL stores; used by tests and by
//! DB-less development. The vote ledger holds a handle to the status cell
//! so the closed check and the duplicate check happen under one write
//! lock, mirroring the transactional SQL implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    BookTitle, NewUser, StatusUpdate, User, UserId, Vote, VoteRecord, VotingStatus,
};

use super::{Result, StatusStore, UserStore, VoteStore, VotingError};

/// In-memory account store.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().unwrap();

        if users.values().any(|u| u.username == user.username) {
            return Err(VotingError::duplicate("username", user.username));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(VotingError::duplicate("email", user.email));
        }

        let created = User {
            id: UserId::new(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users.get(&id).cloned())
    }

    async fn set_admin(&self, username: &str, is_admin: bool) -> Result<bool> {
        let mut users = self.users.write().unwrap();
        match users.values_mut().find(|u| u.username == username) {
            Some(user) => {
                user.is_admin = is_admin;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-memory voting-status singleton. Cloning shares the cell.
#[derive(Clone)]
pub struct InMemoryStatusStore {
    inner: Arc<RwLock<VotingStatus>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(VotingStatus::initial())),
        }
    }
}

impl Default for InMemoryStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn get_status(&self) -> Result<VotingStatus> {
        Ok(*self.inner.read().unwrap())
    }

    async fn set_status(&self, update: StatusUpdate) -> Result<VotingStatus> {
        let mut status = self.inner.write().unwrap();
        *status = update.apply(*status, Utc::now());
        Ok(*status)
    }
}

/// In-memory append-only vote ledger.
pub struct InMemoryVoteStore {
    users: Arc<InMemoryUserStore>,
    status: InMemoryStatusStore,
    votes: RwLock<Vec<Vote>>,
}

impl InMemoryVoteStore {
    pub fn new(users: Arc<InMemoryUserStore>, status: InMemoryStatusStore) -> Self {
        Self {
            users,
            status,
            votes: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VoteStore for InMemoryVoteStore {
    async fn cast_vote(&self, user_id: UserId, book: &BookTitle) -> Result<Vote> {
        if !self.status.get_status().await?.is_active {
            return Err(VotingError::VotingClosed);
        }

        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(VotingError::UserNotFound(user_id));
        }

        // Duplicate check and append under one write lock.
        let mut votes = self.votes.write().unwrap();
        if votes.iter().any(|v| v.user_id == user_id) {
            return Err(VotingError::AlreadyVoted(user_id));
        }

        let vote = Vote {
            id: votes.len() as i64 + 1,
            user_id,
            book: book.clone(),
            created_at: Utc::now(),
        };
        votes.push(vote.clone());
        Ok(vote)
    }

    async fn list_votes(&self) -> Result<Vec<VoteRecord>> {
        // Snapshot under the lock; username resolution awaits afterwards.
        let votes: Vec<Vote> = self.votes.read().unwrap().clone();
        let mut records = Vec::with_capacity(votes.len());
        for vote in votes.iter() {
            let username = self
                .users
                .find_by_id(vote.user_id)
                .await?
                .map(|u| u.username)
                .unwrap_or_default();
            records.push(VoteRecord {
                id: vote.id,
                user_id: vote.user_id,
                username,
                book: vote.book.clone(),
                created_at: vote.created_at,
            });
        }
        Ok(records)
    }
}
