use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{
    error::ProbeFailure,
    target::{LifecycleState, Target},
};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum ProbeStatus {
    Ok,
    Failed,
    Skipped,
}

/// The result of probing one target.
///
/// `latency` covers the whole exchange up to the last byte of the response
/// body; it is zero for skipped and failed probes.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Outcome {
    pub identity: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub lifecycle_state: LifecycleState,
    pub latency: Duration,
    pub failure: Option<ProbeFailure>,
}

impl Outcome {
    pub fn succeeded(target: &Target, latency: Duration) -> Self {
        Self::from_target(target, latency, None)
    }

    pub fn failed(target: &Target, failure: ProbeFailure) -> Self {
        Self::from_target(target, Duration::ZERO, Some(failure))
    }

    pub fn skipped(target: &Target) -> Self {
        Self::from_target(target, Duration::ZERO, None)
    }

    fn from_target(target: &Target, latency: Duration, failure: Option<ProbeFailure>) -> Self {
        Self {
            identity: target.identity.clone(),
            address: target.address.clone(),
            created_at: target.created_at,
            lifecycle_state: target.lifecycle_state.clone(),
            latency,
            failure,
        }
    }

    pub fn status(&self) -> ProbeStatus {
        if !self.lifecycle_state.is_running() {
            ProbeStatus::Skipped
        } else if self.failure.is_some() {
            ProbeStatus::Failed
        } else {
            ProbeStatus::Ok
        }
    }

    /// Text shown in the status column of the report.
    pub fn status_text(&self) -> String {
        match (self.status(), &self.failure) {
            (ProbeStatus::Skipped, _) => "Skipped".to_string(),
            (ProbeStatus::Failed, Some(failure)) => failure.to_string(),
            _ => "OK".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetBuilder;
    use chrono::TimeZone;

    fn target(state: &str) -> Target {
        TargetBuilder::new()
            .with_identity("i-1")
            .with_address("10.0.0.1")
            .with_lifecycle_state(state)
            .with_created_at(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_outcome_copies_target_fields() {
        let target = target("running");
        let outcome = Outcome::succeeded(&target, Duration::from_millis(12));
        assert_eq!(outcome.identity, target.identity);
        assert_eq!(outcome.address, target.address);
        assert_eq!(outcome.created_at, target.created_at);
        assert_eq!(outcome.lifecycle_state, LifecycleState::Running);
        assert_eq!(outcome.status(), ProbeStatus::Ok);
        assert_eq!(outcome.status_text(), "OK");
    }

    #[test]
    fn test_failed_outcome_reports_failure_text() {
        let outcome = Outcome::failed(
            &target("running"),
            ProbeFailure::Transport("connection refused".into()),
        );
        assert_eq!(outcome.latency, Duration::ZERO);
        assert_eq!(outcome.status(), ProbeStatus::Failed);
        assert_eq!(outcome.status_text(), "connection refused");
    }

    #[test]
    fn test_non_running_state_reports_skipped_even_with_failure() {
        let mut outcome = Outcome::skipped(&target("stopped"));
        assert_eq!(outcome.status_text(), "Skipped");
        outcome.failure = Some(ProbeFailure::Transport("fail".into()));
        assert_eq!(outcome.status(), ProbeStatus::Skipped);
        assert_eq!(outcome.status_text(), "Skipped");
    }
}
