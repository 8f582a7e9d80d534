use std::{sync::Arc, time::Instant};

use log::{debug, info};
use tokio::sync::Semaphore;

use crate::{
    collector::{OutcomeCollector, OutcomeSink},
    error::{ProbeFailure, Result},
    outcome::Outcome,
    request::RequestSpec,
    target::Target,
    transport::{HttpTransport, Transport},
};

/// Fans one HTTP request out to every running target and gathers the results.
///
/// Targets that are not `running` are resolved inline as skipped and never
/// reach the transport. Every other target gets its own task; a failure in one
/// task is recorded on that target's outcome and has no effect on the others.
///
/// # Example
/// ```no_run
/// use chrono::Utc;
/// use fleet_probe::{Dispatcher, RequestSpecBuilder, TargetBuilder};
/// use std::time::Duration;
///
/// let targets = vec![TargetBuilder::new()
///     .with_identity("i-0abc")
///     .with_address("10.0.0.12")
///     .with_lifecycle_state("running")
///     .with_created_at(Utc::now())
///     .build()
///     .expect("Failed to build target")];
/// let spec = RequestSpecBuilder::new()
///     .with_path("/health")
///     .with_timeout(Duration::from_millis(500))
///     .build()
///     .expect("Failed to build request spec");
/// tokio_test::block_on(async {
///     let dispatcher = Dispatcher::new().unwrap();
///     for outcome in dispatcher.dispatch(&targets, &spec).await {
///         println!("{} {:?} {}", outcome.identity, outcome.latency, outcome.status_text());
///     }
/// })
/// ```
#[derive(Debug)]
pub struct Dispatcher<T = HttpTransport> {
    transport: Arc<T>,
    max_in_flight: Option<usize>,
}

impl Dispatcher<HttpTransport> {
    /// Creates a dispatcher backed by [`HttpTransport`].
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new()?))
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            max_in_flight: None,
        }
    }

    /// Caps the number of exchanges in flight at once; unbounded by default.
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = Some(limit.max(1));
        self
    }

    /// Probes every target and returns one outcome per target, in no
    /// particular order.
    ///
    /// Resolves only after every probe has completed or failed.
    pub async fn dispatch(&self, targets: &[Target], spec: &RequestSpec) -> Vec<Outcome> {
        let spec = Arc::new(spec.clone());
        let permits = self.max_in_flight.map(|limit| Arc::new(Semaphore::new(limit)));
        let mut collector = OutcomeCollector::new(targets.len());

        for target in targets {
            if !target.lifecycle_state.is_running() {
                debug!(
                    "skipping {} in state {}",
                    target.identity, target.lifecycle_state
                );
                collector.record(Outcome::skipped(target));
                continue;
            }
            let handle = tokio::spawn(Self::probe(
                Arc::clone(&self.transport),
                Arc::clone(&spec),
                permits.clone(),
                target.clone(),
                collector.sink(),
            ));
            collector.track(target.clone(), handle);
        }

        let outcomes = collector.finish().await;
        info!(
            "dispatched {} targets, {} failed",
            outcomes.len(),
            outcomes.iter().filter(|outcome| outcome.failure.is_some()).count()
        );
        outcomes
    }

    async fn probe(
        transport: Arc<T>,
        spec: Arc<RequestSpec>,
        permits: Option<Arc<Semaphore>>,
        target: Target,
        sink: OutcomeSink,
    ) {
        let _permit = match permits {
            Some(permits) => permits.acquire_owned().await.ok(),
            None => None,
        };
        let outcome = match Self::exchange(transport.as_ref(), &spec, &target).await {
            Ok(outcome) => outcome,
            Err(failure) => {
                debug!("probe of {} failed: {}", target.identity, failure);
                Outcome::failed(&target, failure)
            }
        };
        sink.deliver(outcome);
    }

    async fn exchange(
        transport: &T,
        spec: &RequestSpec,
        target: &Target,
    ) -> std::result::Result<Outcome, ProbeFailure> {
        let request = spec.request_for(&target.address)?;
        debug!("{} {} for {}", request.method, request.url, target.identity);

        let start = Instant::now();
        let exchange = tokio::time::timeout(spec.timeout, transport.send(request))
            .await
            .map_err(|_| {
                ProbeFailure::Transport(format!("request timed out after {:?}", spec.timeout))
            })??;
        let latency = start.elapsed();
        debug!(
            "{} answered {} in {:?}",
            target.identity, exchange.status, latency
        );
        Ok(Outcome::succeeded(target, latency))
    }
}
