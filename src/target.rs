use std::{convert::Infallible, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InputBuildError;

/// Operational status of a fleet member.
///
/// The set of states is open: anything the inventory reports that is not one
/// of the well-known names is kept verbatim in [`LifecycleState::Other`].
/// Only [`LifecycleState::Running`] members are probed.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LifecycleState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    #[default]
    Unknown,
    Other(String),
}

impl LifecycleState {
    pub fn is_running(&self) -> bool {
        matches!(self, LifecycleState::Running)
    }

    pub fn as_str(&self) -> &str {
        match self {
            LifecycleState::Pending => "pending",
            LifecycleState::Running => "running",
            LifecycleState::ShuttingDown => "shutting-down",
            LifecycleState::Terminated => "terminated",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Unknown => "unknown",
            LifecycleState::Other(state) => state,
        }
    }
}

impl From<&str> for LifecycleState {
    fn from(state: &str) -> Self {
        match state {
            "pending" => LifecycleState::Pending,
            "running" => LifecycleState::Running,
            "shutting-down" => LifecycleState::ShuttingDown,
            "terminated" => LifecycleState::Terminated,
            "stopping" => LifecycleState::Stopping,
            "stopped" => LifecycleState::Stopped,
            "" | "unknown" => LifecycleState::Unknown,
            other => LifecycleState::Other(other.to_string()),
        }
    }
}

impl From<String> for LifecycleState {
    fn from(state: String) -> Self {
        LifecycleState::from(state.as_str())
    }
}

impl From<LifecycleState> for String {
    fn from(state: LifecycleState) -> Self {
        match state {
            LifecycleState::Other(state) => state,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for LifecycleState {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(LifecycleState::from(s))
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fleet member as reported by the inventory.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct Target {
    pub identity: String,
    pub address: String,
    pub lifecycle_state: LifecycleState,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct TargetBuilder {
    identity: Option<String>,
    address: Option<String>,
    lifecycle_state: Option<LifecycleState>,
    created_at: Option<DateTime<Utc>>,
}

impl TargetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_lifecycle_state(mut self, state: impl Into<LifecycleState>) -> Self {
        self.lifecycle_state = Some(state.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Builds the target; a missing lifecycle state defaults to `unknown`.
    pub fn build(&self) -> std::result::Result<Target, InputBuildError> {
        Ok(Target {
            identity: self
                .identity
                .clone()
                .filter(|identity| !identity.is_empty())
                .ok_or(InputBuildError::MissingIdentity)?,
            address: self
                .address
                .clone()
                .filter(|address| !address.is_empty())
                .ok_or(InputBuildError::MissingAddress)?,
            lifecycle_state: self.lifecycle_state.clone().unwrap_or_default(),
            created_at: self.created_at.ok_or(InputBuildError::MissingCreatedAt)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_known_states_round_trip_through_strings() {
        for name in [
            "pending",
            "running",
            "shutting-down",
            "terminated",
            "stopping",
            "stopped",
            "unknown",
        ] {
            let state = LifecycleState::from(name);
            assert!(!matches!(state, LifecycleState::Other(_)), "{name}");
            assert_eq!(state.to_string(), name);
        }
    }

    #[test]
    fn test_unrecognised_state_is_kept_verbatim() {
        let state: LifecycleState = "hibernating".parse().unwrap();
        assert_eq!(state, LifecycleState::Other("hibernating".into()));
        assert_eq!(state.as_str(), "hibernating");
        assert!(!state.is_running());
    }

    #[test]
    fn test_empty_state_is_unknown() {
        assert_eq!(LifecycleState::from(""), LifecycleState::Unknown);
    }

    #[test]
    fn test_builder_defaults_state_to_unknown() {
        let target = TargetBuilder::new()
            .with_identity("i-1")
            .with_address("10.0.0.1")
            .with_created_at(Utc.timestamp_opt(0, 0).unwrap())
            .build()
            .unwrap();
        assert_eq!(target.lifecycle_state, LifecycleState::Unknown);
    }

    #[test]
    fn test_builder_rejects_missing_fields() {
        let created_at = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(
            TargetBuilder::new()
                .with_address("10.0.0.1")
                .with_created_at(created_at)
                .build(),
            Err(InputBuildError::MissingIdentity)
        );
        assert_eq!(
            TargetBuilder::new()
                .with_identity("i-1")
                .with_address("")
                .with_created_at(created_at)
                .build(),
            Err(InputBuildError::MissingAddress)
        );
        assert_eq!(
            TargetBuilder::new()
                .with_identity("i-1")
                .with_address("10.0.0.1")
                .build(),
            Err(InputBuildError::MissingCreatedAt)
        );
    }

    #[test]
    fn test_state_deserializes_from_plain_string() {
        let state: LifecycleState = serde_json::from_str("\"stopped\"").unwrap();
        assert_eq!(state, LifecycleState::Stopped);
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"stopped\"");
    }
}
