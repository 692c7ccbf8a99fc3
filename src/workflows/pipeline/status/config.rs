use serde::{Deserialize, Serialize};

/// Thresholds feeding status derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConfig {
    /// How many days before a segment's expiry date a fully linked project is
    /// flagged as expiring. The window is inclusive at both ends.
    pub expiry_window_days: i64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            expiry_window_days: 30,
        }
    }
}
