//! Jobs command implementation.

use crate::cli::JobsArgs;
use crate::error::Result;
use crate::output::Formatter;
use redyce_domain::traits::JobLedger;
use redyce_domain::ProjectId;
use redyce_scheduler::PriorityManager;
use std::fmt::Display;

/// Execute the jobs command.
pub fn execute_jobs<J>(
    args: JobsArgs,
    manager: &PriorityManager<J>,
    formatter: &Formatter,
) -> Result<()>
where
    J: JobLedger,
    J::Error: Display,
{
    if args.cleanup {
        let evicted = manager.cleanup_completed_jobs();
        println!(
            "{}",
            formatter.info(&format!("Evicted {} finished job(s)", evicted))
        );
    }

    let project_id = args.project.map(ProjectId::new);
    let jobs = manager.list_jobs(project_id.as_ref());
    println!("{}", formatter.format_jobs(&jobs)?);
    Ok(())
}
