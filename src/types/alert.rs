//! Per-patient alert state

use serde::{Deserialize, Serialize};

/// Alert state of a single patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    /// No alert outstanding (initial state)
    #[default]
    Resolved,
    /// An alert has been triggered and not yet resolved
    Active,
}

impl AlertState {
    pub fn is_active(self) -> bool {
        self == AlertState::Active
    }
}

impl std::fmt::Display for AlertState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertState::Resolved => write!(f, "resolved"),
            AlertState::Active => write!(f, "active"),
        }
    }
}
