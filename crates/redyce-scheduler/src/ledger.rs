//! Ledger used when jobs need not survive a restart

use redyce_domain::traits::JobLedger;
use redyce_domain::{Job, JobId};
use std::convert::Infallible;

/// A `JobLedger` that records nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLedger;

impl JobLedger for NullLedger {
    type Error = Infallible;

    fn save_job(&mut self, _job: &Job) -> Result<(), Self::Error> {
        Ok(())
    }

    fn delete_job(&mut self, _id: JobId) -> Result<(), Self::Error> {
        Ok(())
    }

    fn load_jobs(&self) -> Result<Vec<Job>, Self::Error> {
        Ok(Vec::new())
    }
}
