//! The voting-status singleton and its partial-update form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Singleton flag set controlling vote acceptance and result visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingStatus {
    /// Whether votes are currently accepted.
    pub is_active: bool,
    /// Whether aggregate results are visible to voters.
    pub display_results: bool,
    pub last_updated: DateTime<Utc>,
}

impl VotingStatus {
    /// State at first boot: voting closed, results hidden.
    pub fn initial() -> Self {
        Self {
            is_active: false,
            display_results: false,
            last_updated: Utc::now(),
        }
    }
}

/// Partial update for the singleton. `None` fields are preserved, never reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_results: Option<bool>,
}

impl StatusUpdate {
    /// True when no field is specified; such an update is a no-op.
    pub fn is_empty(&self) -> bool {
        self.is_active.is_none() && self.display_results.is_none()
    }

    pub fn with_active(mut self, value: bool) -> Self {
        self.is_active = Some(value);
        self
    }

    pub fn with_results(mut self, value: bool) -> Self {
        self.display_results = Some(value);
        self
    }

    /// Merge this update into a status.
    ///
    /// `last_updated` advances only when at least one field is specified;
    /// an empty update returns the status untouched.
    pub fn apply(self, status: VotingStatus, now: DateTime<Utc>) -> VotingStatus {
        if self.is_empty() {
            return status;
        }
        VotingStatus {
            is_active: self.is_active.unwrap_or(status.is_active),
            display_results: self.display_results.unwrap_or(status.display_results),
            last_updated: now,
        }
    }
}
