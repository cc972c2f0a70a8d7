//! HTTP API layer for the book poll.
//!
//! Routes, shared request/response types, and the structured error envelope.

mod error;
mod rest;
mod types;

pub use error::*;
pub use rest::*;
pub use types::*;
