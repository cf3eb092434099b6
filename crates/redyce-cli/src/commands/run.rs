//! Run command implementation.

use super::Extractor;
use crate::cli::RunArgs;
use crate::error::Result;
use crate::output::Formatter;
use redyce_domain::traits::{CompletionClient, JobLedger};
use redyce_domain::{JobId, JobStatus, JobType, ProjectId, UserId};
use redyce_extractor::{ProjectRunner, RunnerOutcome};
use redyce_scheduler::{JobSweeper, PriorityManager};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Execute the run command.
///
/// A job left PAUSED or PENDING by an earlier run of the same project is
/// resumed from its cursor instead of registering a new one. Ctrl+C pauses
/// the job after the document in flight.
pub async fn execute_run<L, J>(
    args: RunArgs,
    extractor: &Arc<Extractor<L>>,
    manager: &Arc<PriorityManager<J>>,
    formatter: &Formatter,
) -> Result<()>
where
    L: CompletionClient + Send + Sync + 'static,
    L::Error: Display,
    J: JobLedger + Send + 'static,
    J::Error: Display,
{
    let (shutdown, shutdown_rx) = watch::channel(false);
    let mut sweeper = JobSweeper::new(Arc::clone(manager));
    let sweeper_task = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    let outcome = run_project(args, extractor, manager).await;

    let _ = shutdown.send(true);
    match sweeper_task.await {
        Ok(metrics) => debug!("Job sweeper stopped: {}", metrics.summary()),
        Err(e) => warn!(error = %e, "Job sweeper task failed"),
    }

    println!("{}", formatter.format_run(&outcome?)?);
    Ok(())
}

async fn run_project<L, J>(
    args: RunArgs,
    extractor: &Arc<Extractor<L>>,
    manager: &Arc<PriorityManager<J>>,
) -> Result<RunnerOutcome>
where
    L: CompletionClient + Send + Sync + 'static,
    L::Error: Display,
    J: JobLedger,
    J::Error: Display,
{
    let project_id = ProjectId::new(args.project);
    let runner = ProjectRunner::new(Arc::clone(extractor), Arc::clone(manager))
        .with_user(UserId::new(args.user));

    let resumable = resumable_job(manager, &project_id);
    let run = async {
        match resumable {
            Some(job_id) => {
                info!(%job_id, "Resuming unfinished extraction job");
                runner.resume(job_id).await
            }
            None => runner.start(&project_id).await,
        }
    };
    tokio::pin!(run);

    let outcome = tokio::select! {
        outcome = &mut run => outcome?,
        _ = tokio::signal::ctrl_c() => {
            if let Some(job) = manager.active_job(&project_id) {
                warn!(job_id = %job.id, "Interrupted, pausing after the current document");
                manager.pause_job(job.id);
            }
            run.await?
        }
    };
    Ok(outcome)
}

/// Most recent requirement-extraction job of the project that can still run
fn resumable_job<J>(manager: &PriorityManager<J>, project_id: &ProjectId) -> Option<JobId>
where
    J: JobLedger,
    J::Error: Display,
{
    manager
        .jobs_for_project(project_id)
        .into_iter()
        .rev()
        .find(|job| {
            job.job_type == JobType::RequirementExtraction
                && matches!(job.status, JobStatus::Paused | JobStatus::Pending)
        })
        .map(|job| job.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{extractor, text_document};
    use crate::config::OutputFormat;
    use redyce_domain::DocumentId;
    use redyce_llm::MockProvider;

    fn args(project: &str) -> RunArgs {
        RunArgs {
            project: project.to_string(),
            user: "system".to_string(),
        }
    }

    #[tokio::test]
    async fn test_run_registers_and_completes_job() {
        let extractor = extractor(
            MockProvider::default(),
            &[text_document("d1", "p1"), text_document("d2", "p1")],
        );
        let manager = Arc::new(PriorityManager::default_config());

        let outcome = run_project(args("p1"), &extractor, &manager).await.unwrap();
        let RunnerOutcome::Completed { job_id, outcomes } = outcome else {
            panic!("expected completion, got {:?}", outcome);
        };
        assert_eq!(outcomes.len(), 2);
        assert_eq!(manager.get_job(job_id).unwrap().status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_run_resumes_paused_job() {
        let extractor = extractor(
            MockProvider::default(),
            &[text_document("d1", "p1"), text_document("d2", "p1")],
        );
        let manager = Arc::new(PriorityManager::default_config());
        let paused = manager.register_job(
            ProjectId::new("p1"),
            JobType::RequirementExtraction,
            vec![DocumentId::new("d1"), DocumentId::new("d2")],
        );
        assert!(manager.pause_job(paused));

        let outcome = run_project(args("p1"), &extractor, &manager).await.unwrap();
        assert_eq!(outcome.job_id(), paused);
        assert!(matches!(
            outcome,
            RunnerOutcome::Completed { ref outcomes, .. } if outcomes.len() == 2
        ));
        assert_eq!(manager.list_jobs(None).len(), 1);
    }

    #[tokio::test]
    async fn test_execute_run_stops_sweeper() {
        let extractor = extractor(MockProvider::default(), &[text_document("d1", "p1")]);
        let manager = Arc::new(PriorityManager::default_config());
        let formatter = Formatter::new(OutputFormat::Json, false);

        execute_run(args("p1"), &extractor, &manager, &formatter)
            .await
            .unwrap();
        assert_eq!(extractor.llm().call_count(), 1);
    }
}
