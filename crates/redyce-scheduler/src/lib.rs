//! Redyce Scheduler
//!
//! In-process coordination of per-project jobs by priority.
//!
//! # Overview
//!
//! - **Priority manager**: one lock per project; HIGH jobs (interactive
//!   question extraction, answer generation) preempt a RUNNING LOW job
//!   (background requirement extraction), never the reverse
//! - **Resumption**: completing a HIGH job hands the paused LOW job back as
//!   PENDING with its document cursor intact
//! - **Events**: every transition is broadcast as a [`JobEvent`]
//! - **Ledger**: an optional `JobLedger` makes jobs survive a restart
//! - **Sweeper**: finished jobs are evicted after a retention period
//!
//! # Usage
//!
//! ```
//! use redyce_scheduler::{PriorityManager, SchedulerConfig};
//! use redyce_domain::{JobType, ProjectId};
//!
//! let manager = PriorityManager::new(SchedulerConfig::default());
//! let job = manager.register_job(ProjectId::new("p"), JobType::AnswerGeneration, vec![]);
//! assert!(manager.start_job(job).acquired());
//! manager.complete_job(job, true, None);
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [scheduler]
//! retention_secs = 3600
//! sweep_interval_secs = 300
//! event_capacity = 256
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod events;
mod ledger;
mod manager;
mod metrics;
mod worker;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use events::JobEvent;
pub use ledger::NullLedger;
pub use manager::{PriorityManager, StartDecision};
pub use metrics::SweepMetrics;
pub use worker::JobSweeper;
