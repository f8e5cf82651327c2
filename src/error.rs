//! Error taxonomy for the load / filter / compare cycle.
//!
//! Domain failures are typed so callers can tell a recoverable problem
//! (a dropped row, a bad selection) from a terminal one (the fetch failed).
//! Plumbing errors elsewhere in the crate stay on `anyhow`.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("failed to fetch {url}: {reason}")]
    NetworkFailure { url: String, reason: String },

    #[error("line {line}: expected {expected} value(s), found {found}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("no data rows found after the header")]
    EmptyInput,

    #[error("select at least two items to compare ({provided} given)")]
    InvalidSelection { provided: usize },

    #[error("no data has been loaded yet")]
    NotLoaded,
}

impl ViewError {
    /// Errors that end the load cycle rather than being recovered in place.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ViewError::NetworkFailure { .. })
    }
}
