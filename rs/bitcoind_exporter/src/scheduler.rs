//! The poll loop.
//!
//! Every tick polls all configured nodes concurrently and waits for all of
//! them before sleeping, so ticks never overlap. A poll that fails with a
//! startup message of its coin is skipped until the next tick; any other
//! failure ends the loop. The configured [`FailureDomain`] decides whether
//! the other nodes of that tick are still reconciled.

use crate::{
    collector::collect_snapshot,
    config::{FailureDomain, LabelMode, NodeConfig},
    error::{ErrorClass, PollError},
    metrics::{
        ExporterMetrics, NodeLabels, POLL_STATUS_FATAL, POLL_STATUS_OK, POLL_STATUS_TRANSIENT,
    },
    reconciler::{reconcile, NodePreviousState},
    rpc::RpcClient,
};
use async_trait::async_trait;
use futures::future::{join_all, try_join_all};
use mockall::automock;
use slog::{error, info, o, Logger};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// Lower bound of the pause between two ticks.
pub const MIN_DELAY: Duration = Duration::from_millis(10);

#[automock]
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// The pause after a tick that took `elapsed`.
pub fn next_delay(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed).max(MIN_DELAY)
}

/// Polls one node and owns what was last published for it.
pub struct NodePoller {
    config: NodeConfig,
    client: Arc<dyn RpcClient>,
    previous: NodePreviousState,
    labels: NodeLabels,
    log: Logger,
}

impl NodePoller {
    pub fn new(
        config: NodeConfig,
        client: Arc<dyn RpcClient>,
        label_mode: LabelMode,
        log: &Logger,
    ) -> Self {
        let labels = NodeLabels::new(label_mode, &config.name);
        let log = log.new(o!("node" => config.name.clone()));
        Self {
            config,
            client,
            previous: NodePreviousState::default(),
            labels,
            log,
        }
    }

    pub fn previous(&self) -> &NodePreviousState {
        &self.previous
    }

    /// Collects a snapshot and reconciles it. Startup-transient failures
    /// leave the previous state untouched and are not returned.
    pub async fn poll(
        &mut self,
        metrics: &ExporterMetrics,
        clock: &dyn Clock,
    ) -> Result<(), PollError> {
        let start = clock.now();
        let result = match collect_snapshot(self.config.coin, self.client.as_ref()).await {
            Ok(snapshot) => {
                reconcile(
                    &snapshot,
                    &mut self.previous,
                    metrics,
                    &self.labels,
                    &self.log,
                );
                Ok(())
            }
            Err(source) => Err(PollError {
                node: self.config.name.clone(),
                source,
            }),
        };

        let (status, result) = match result {
            Ok(()) => (POLL_STATUS_OK, Ok(())),
            Err(err) => match err.classify(self.config.coin) {
                ErrorClass::StartupTransient(message) => {
                    info!(self.log, "waiting node because: {}", message.to_lowercase());
                    (POLL_STATUS_TRANSIENT, Ok(()))
                }
                ErrorClass::Fatal => (POLL_STATUS_FATAL, Err(err)),
            },
        };
        metrics
            .polls
            .with_label_values(&self.labels.with(&[status]))
            .inc();
        metrics
            .poll_duration
            .with_label_values(&self.labels.with(&[]))
            .observe(clock.now().saturating_duration_since(start).as_secs_f64());
        result
    }
}

pub struct PollScheduler {
    nodes: Vec<NodePoller>,
    metrics: ExporterMetrics,
    clock: Arc<dyn Clock>,
    interval: Duration,
    failure_domain: FailureDomain,
    log: Logger,
}

impl PollScheduler {
    pub fn new(
        nodes: Vec<NodePoller>,
        metrics: ExporterMetrics,
        clock: Arc<dyn Clock>,
        interval: Duration,
        failure_domain: FailureDomain,
        log: Logger,
    ) -> Self {
        Self {
            nodes,
            metrics,
            clock,
            interval,
            failure_domain,
            log,
        }
    }

    pub fn nodes(&self) -> &[NodePoller] {
        &self.nodes
    }

    /// Polls every node once. In the node failure domain every poll runs to
    /// completion before the first fatal error is returned.
    pub async fn tick(&mut self) -> Result<(), PollError> {
        let metrics = &self.metrics;
        let clock = self.clock.as_ref();
        let polls = self
            .nodes
            .iter_mut()
            .map(|node| node.poll(metrics, clock));

        match self.failure_domain {
            FailureDomain::Tick => {
                try_join_all(polls).await?;
            }
            FailureDomain::Node => {
                let mut first_error = None;
                for err in join_all(polls).await.into_iter().filter_map(Result::err) {
                    error!(self.log, "{}: {}", err, err.source);
                    first_error.get_or_insert(err);
                }
                if let Some(err) = first_error {
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// One tick followed by the pause before the next one.
    pub async fn step(&mut self) -> Result<(), PollError> {
        let start = self.clock.now();
        self.tick().await?;
        let elapsed = self.clock.now().saturating_duration_since(start);
        self.clock.sleep(next_delay(self.interval, elapsed)).await;
        Ok(())
    }

    /// Polls until a fatal error ends the loop.
    pub async fn run(&mut self) -> Result<(), PollError> {
        info!(
            self.log,
            "polling {} node(s) every {:?}",
            self.nodes.len(),
            self.interval
        );
        loop {
            self.step().await?;
        }
    }
}
