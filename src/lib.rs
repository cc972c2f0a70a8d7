//! Bookvote Library
//!
//! Backend for a two-option book poll: accounts, one vote per account,
//! an admin-controlled voting window, and derived results.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (accounts, votes, voting status, ballot)
//! - [`infra`] - Storage implementations (PostgreSQL, in-memory)
//! - [`auth`] - Authentication (passwords, JWT, middleware)
//! - [`tally`] - Aggregation over the vote ledger
//! - [`metrics`] - Observability and metrics
//! - [`api`] - REST API routes
//! - [`client`] - Typed HTTP client and status poller
//! - [`server`] - HTTP server bootstrap

pub mod api;
pub mod auth;
pub mod client;
pub mod domain;
pub mod infra;
pub mod metrics;
pub mod migrations;
pub mod server;
pub mod tally;

// Re-export commonly used types
pub use domain::{
    ballot_titles, is_on_ballot, BallotOption, BookTitle, NewUser, StatusUpdate, User, UserId,
    Vote, VoteRecord, VotingStatus, BALLOT,
};

pub use infra::{Result, StatusStore, UserStore, VoteStore, VotingError};
