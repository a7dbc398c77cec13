use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::aggregate::DEFAULT_TOP_REASONS;
use crate::error::DashboardError;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "booking-dash.json";

/// Dashboard settings.  Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Bookings file opened at startup.
    pub data_path: PathBuf,
    /// Status label of a completed booking.
    pub completed_status: String,
    /// Reasons shown on the "Top Cancel Reasons" KPI card.
    pub top_cancel_reasons: usize,
    /// Rows in the cancel reasons table.
    pub cancel_table_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("booking_raw.csv"),
            completed_status: "เสร็จสิ้น".to_string(),
            top_cancel_reasons: DEFAULT_TOP_REASONS,
            cancel_table_rows: 5,
        }
    }
}

impl DashboardConfig {
    /// Read `path`; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No {} found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(DashboardError::Config {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };
        serde_json::from_str(&text).map_err(|e| DashboardError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// [`DashboardConfig::load`], logging and falling back to defaults on error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("{e}; using default settings");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DashboardConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(cfg, DashboardConfig::default());
        assert_eq!(cfg.top_cancel_reasons, 3);
    }

    #[test]
    fn partial_file_overrides_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"completed_status": "COMPLETED", "data_path": "data/b.csv"}"#)
            .unwrap();

        let cfg = DashboardConfig::load(&path).unwrap();
        assert_eq!(cfg.completed_status, "COMPLETED");
        assert_eq!(cfg.data_path, PathBuf::from("data/b.csv"));
        assert_eq!(cfg.cancel_table_rows, 5);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"completed_statu": "x"}"#).unwrap();

        assert!(matches!(
            DashboardConfig::load(&path),
            Err(DashboardError::Config { .. })
        ));
        assert_eq!(DashboardConfig::load_or_default(&path), DashboardConfig::default());
    }
}
