//! Metrics collected by the job sweeper

/// Counters for sweep cycles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepMetrics {
    /// Total sweep iterations completed
    pub sweep_count: usize,

    /// Jobs evicted across all sweeps
    pub evicted: usize,

    /// Jobs evicted by the most recent sweep
    pub last_evicted: usize,
}

impl SweepMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sweep cycle and how many jobs it evicted
    pub fn record_sweep(&mut self, evicted: usize) {
        self.sweep_count += 1;
        self.evicted += evicted;
        self.last_evicted = evicted;
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} sweep cycles, {} jobs evicted (last sweep: {})",
            self.sweep_count, self.evicted, self.last_evicted
        )
    }
}
