//! Background worker that evicts finished jobs on a schedule

use crate::{PriorityManager, SweepMetrics};
use redyce_domain::traits::JobLedger;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration};

/// Periodically calls [`PriorityManager::cleanup_completed_jobs`]
///
/// # Examples
///
/// ```no_run
/// use redyce_scheduler::{JobSweeper, PriorityManager, SchedulerConfig};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let manager = Arc::new(PriorityManager::new(SchedulerConfig::default()));
///     let (stop, stopped) = tokio::sync::watch::channel(false);
///
///     let mut sweeper = JobSweeper::new(manager.clone());
///     let handle = tokio::spawn(async move { sweeper.run(stopped).await });
///
///     // ... later
///     let _ = stop.send(true);
///     let _ = handle.await;
/// }
/// ```
pub struct JobSweeper<L: JobLedger> {
    manager: Arc<PriorityManager<L>>,
    interval: Duration,
    metrics: SweepMetrics,
}

impl<L> JobSweeper<L>
where
    L: JobLedger,
    L::Error: Display,
{
    /// Create a sweeper using the manager's configured interval
    pub fn new(manager: Arc<PriorityManager<L>>) -> Self {
        let interval = manager.config().sweep_interval();
        Self {
            manager,
            interval,
            metrics: SweepMetrics::new(),
        }
    }

    /// Override the sweep interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    fn sweep(&mut self) -> usize {
        let evicted = self.manager.cleanup_completed_jobs();
        self.metrics.record_sweep(evicted);
        evicted
    }

    /// Run until `shutdown` flips to `true` (or its sender is dropped) or
    /// Ctrl+C is received
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> SweepMetrics {
        let mut ticker = interval(self.interval);

        tracing::info!("Job sweeper started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.sweep();
                    tracing::debug!(evicted, "Sweep cycle completed");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Shutdown requested, stopping job sweeper");
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping job sweeper");
                    break;
                }
            }
        }

        tracing::info!("Job sweeper stopped: {}", self.metrics.summary());
        self.metrics.clone()
    }

    /// Run for a specific number of cycles (useful for testing)
    pub async fn run_cycles(&mut self, cycles: usize) -> SweepMetrics {
        let mut ticker = interval(self.interval);

        for cycle in 0..cycles {
            ticker.tick().await;
            let evicted = self.sweep();
            tracing::debug!("Sweep {}/{} evicted {} jobs", cycle + 1, cycles, evicted);
        }

        tracing::info!("Job sweeper finished {} cycles: {}", cycles, self.metrics.summary());
        self.metrics.clone()
    }

    /// Get the sweeper's current metrics
    pub fn metrics(&self) -> &SweepMetrics {
        &self.metrics
    }

    /// Reset the sweeper's metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }
}
