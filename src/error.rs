use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors surfaced by the booking pipeline to the UI.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// File missing, unreadable, or not matching the booking schema.
    #[error("cannot load {}: {reason}", path.display())]
    DataSource { path: PathBuf, reason: String },

    /// Filter date range with `start > end`.
    #[error("invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl DashboardError {
    /// Wrap a loader failure, keeping the whole context chain.
    pub fn data_source(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        DashboardError::DataSource {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }
}
