use std::path::PathBuf;

use thiserror::Error as ThisError;

pub type OpaqueError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal errors raised before any probe is dispatched.
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("POST file does not exist: {}", .0.display())]
    PayloadMissing(PathBuf),
    #[error("failed to read POST file {}: {source}", .path.display())]
    PayloadRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid timeout {0:?}, expected a positive duration such as 500ms or 3s")]
    InvalidTimeout(String),
    #[error("inventory error: {0}")]
    Inventory(String),
    #[error("no fleet found with name {fleet} in region {region}")]
    FleetNotFound { fleet: String, region: String },
    #[error("{0}")]
    Opaque(#[from] OpaqueError),
}
pub type Result<T> = std::result::Result<T, Error>;

#[allow(clippy::enum_variant_names)]
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputBuildError {
    #[error("target identity is required")]
    MissingIdentity,
    #[error("target address is required")]
    MissingAddress,
    #[error("target creation time is required")]
    MissingCreatedAt,
    #[error("request path must start with '/', got {0:?}")]
    InvalidPath(String),
    #[error("request timeout must be positive")]
    InvalidTimeout,
}

/// Why a single target's probe did not succeed.
///
/// Failures are scoped to one target and recorded on its outcome; they never
/// abort the dispatch as a whole.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("failed to build request: {0}")]
    RequestConstruction(String),
    #[error("{0}")]
    Transport(String),
    #[error("failed to read response body: {0}")]
    BodyRead(String),
    #[error("probe aborted: {0}")]
    Aborted(String),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum FailureKind {
    RequestConstruction,
    Transport,
    BodyRead,
    Aborted,
}

impl ProbeFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeFailure::RequestConstruction(_) => FailureKind::RequestConstruction,
            ProbeFailure::Transport(_) => FailureKind::Transport,
            ProbeFailure::BodyRead(_) => FailureKind::BodyRead,
            ProbeFailure::Aborted(_) => FailureKind::Aborted,
        }
    }
}

/// Renders an error followed by its chain of sources, `outer: inner: root`.
pub(crate) fn describe_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
