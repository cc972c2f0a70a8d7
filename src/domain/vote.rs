//! Ledger entries and the fixed ballot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookTitle, UserId};

/// One choice on the ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BallotOption {
    pub title: &'static str,
    pub author: &'static str,
}

/// The fixed option set this poll runs on.
pub const BALLOT: [BallotOption; 2] = [
    BallotOption {
        title: "1984",
        author: "George Orwell",
    },
    BallotOption {
        title: "Brave New World",
        author: "Aldous Huxley",
    },
];

/// Ballot titles in display order.
pub fn ballot_titles() -> Vec<BookTitle> {
    BALLOT
        .iter()
        .map(|option| BookTitle::new(option.title))
        .collect()
}

/// Whether a title is a valid ballot option.
pub fn is_on_ballot(title: &BookTitle) -> bool {
    BALLOT.iter().any(|option| option.title == title.as_str())
}

/// An immutable ledger entry. Created once; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Ledger position (insertion order).
    pub id: i64,
    pub user_id: UserId,
    pub book: BookTitle,
    pub created_at: DateTime<Utc>,
}

/// A ledger entry joined with the voter's username for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: i64,
    pub user_id: UserId,
    pub username: String,
    pub book: BookTitle,
    pub created_at: DateTime<Utc>,
}
