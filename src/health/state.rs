//! Target health state.
//!
//! # States
//! - Normal: the last probe reached the target and ran its query
//! - Abnormal: the last probe failed (connect, query or deadline)
//!
//! Only transitions between the two are persisted; see
//! `storage::recorder`.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Normal,
    Abnormal,
}

impl HealthState {
    /// The persisted spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Normal => "normal",
            HealthState::Abnormal => "abnormal",
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, HealthState::Normal)
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(HealthState::Normal),
            "abnormal" => Ok(HealthState::Abnormal),
            other => Err(format!("unknown health state '{}'", other)),
        }
    }
}

impl<E> From<&Result<(), E>> for HealthState {
    fn from(outcome: &Result<(), E>) -> Self {
        if outcome.is_ok() {
            HealthState::Normal
        } else {
            HealthState::Abnormal
        }
    }
}
