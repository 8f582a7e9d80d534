use log::warn;
use tokio::{
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

use crate::{error::ProbeFailure, outcome::Outcome, target::Target};

/// Handle held by a probe task to deliver its outcome.
#[derive(Debug, Clone)]
pub(super) struct OutcomeSink {
    sender: UnboundedSender<Outcome>,
}

impl OutcomeSink {
    pub(super) fn deliver(self, outcome: Outcome) {
        // The receiver lives until `finish` has joined every task.
        let _ = self.sender.send(outcome);
    }
}

/// Merges outcomes from concurrent probe tasks into one list.
///
/// Every target handed to the collector is accounted for exactly once, either
/// through [`OutcomeCollector::record`], through its task's sink, or, if the
/// task died before delivering, by a backfilled [`ProbeFailure::Aborted`].
#[derive(Debug)]
pub(super) struct OutcomeCollector {
    sender: UnboundedSender<Outcome>,
    receiver: UnboundedReceiver<Outcome>,
    tasks: Vec<(Target, JoinHandle<()>)>,
    capacity: usize,
}

impl OutcomeCollector {
    pub(super) fn new(capacity: usize) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            sender,
            receiver,
            tasks: Vec::new(),
            capacity,
        }
    }

    pub(super) fn sink(&self) -> OutcomeSink {
        OutcomeSink {
            sender: self.sender.clone(),
        }
    }

    pub(super) fn record(&self, outcome: Outcome) {
        let _ = self.sender.send(outcome);
    }

    pub(super) fn track(&mut self, target: Target, handle: JoinHandle<()>) {
        self.tasks.push((target, handle));
    }

    /// Waits for every tracked task and returns all outcomes.
    pub(super) async fn finish(self) -> Vec<Outcome> {
        let Self {
            sender,
            mut receiver,
            tasks,
            capacity,
        } = self;

        let (targets, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
        let joined = futures::future::join_all(handles).await;
        for (target, result) in targets.iter().zip(joined) {
            if let Err(err) = result {
                warn!("probe task for {} did not complete: {}", target.identity, err);
                let _ = sender.send(Outcome::failed(
                    target,
                    ProbeFailure::Aborted(err.to_string()),
                ));
            }
        }
        drop(sender);

        let mut outcomes = Vec::with_capacity(capacity);
        while let Some(outcome) = receiver.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::{error::FailureKind, target::TargetBuilder};

    fn target(identity: &str) -> Target {
        TargetBuilder::new()
            .with_identity(identity)
            .with_address("10.0.0.1")
            .with_lifecycle_state("running")
            .with_created_at(Utc::now())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_finish_waits_for_all_tasks() {
        let mut collector = OutcomeCollector::new(3);
        collector.record(Outcome::skipped(&target("i-0")));
        for (identity, delay) in [("i-1", 30), ("i-2", 5)] {
            let target = target(identity);
            let sink = collector.sink();
            let task_target = target.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                sink.deliver(Outcome::succeeded(&task_target, Duration::from_millis(delay)));
            });
            collector.track(target, handle);
        }

        let mut identities: Vec<_> = collector
            .finish()
            .await
            .into_iter()
            .map(|outcome| outcome.identity)
            .collect();
        identities.sort();
        assert_eq!(identities, ["i-0", "i-1", "i-2"]);
    }

    #[tokio::test]
    async fn test_panicked_task_is_backfilled() {
        let mut collector = OutcomeCollector::new(1);
        let sink = collector.sink();
        let handle = tokio::spawn(async move {
            let _sink = sink;
            panic!("boom");
        });
        collector.track(target("i-1"), handle);

        let outcomes = collector.finish().await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0].failure.as_ref().map(ProbeFailure::kind),
            Some(FailureKind::Aborted)
        );
    }
}
