//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use redyce_domain::{DocumentSummary, Job, Requirement};
use redyce_extractor::{BackfillReport, ExtractionOutcome, RunnerOutcome};
use serde_json::{json, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format document statuses.
    pub fn format_documents(&self, documents: &[DocumentSummary]) -> Result<String> {
        if self.format == OutputFormat::Json {
            let values: Vec<Value> = documents
                .iter()
                .map(|d| {
                    json!({
                        "id": d.id.as_str(),
                        "project_id": d.project_id.as_str(),
                        "name": d.name,
                        "mime_type": d.mime_type,
                        "requirement_status": d.requirement_status.map(|s| s.as_str()),
                        "requirement_processed_at": d.requirement_processed_at,
                        "requirement_error_message": d.requirement_error_message,
                    })
                })
                .collect();
            return Ok(serde_json::to_string_pretty(&values)?);
        }

        if documents.is_empty() {
            return Ok(self.colorize("No documents found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Project", "Name", "Status", "Error"]);
        for document in documents {
            let status = document
                .requirement_status
                .map(|s| s.as_str())
                .unwrap_or("-");
            builder.push_record([
                document.id.as_str(),
                document.project_id.as_str(),
                &document.name,
                &self.colorize_status(status),
                document.requirement_error_message.as_deref().unwrap_or(""),
            ]);
        }
        Ok(self.render(builder))
    }

    /// Format requirements.
    pub fn format_requirements(&self, requirements: &[Requirement]) -> Result<String> {
        if self.format == OutputFormat::Json {
            let values: Vec<Value> = requirements.iter().map(requirement_json).collect();
            return Ok(serde_json::to_string_pretty(&values)?);
        }

        if requirements.is_empty() {
            return Ok(self.colorize("No requirements found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Code", "Title", "Priority", "Status", "Page"]);
        for requirement in requirements {
            let page = requirement
                .source_page
                .map(|p| p.to_string())
                .unwrap_or_default();
            builder.push_record([
                requirement.code.as_deref().unwrap_or(""),
                &requirement.title,
                requirement.priority.as_str(),
                requirement.status.as_str(),
                &page,
            ]);
        }
        Ok(self.render(builder))
    }

    /// Format the outcome of one extraction.
    pub fn format_outcome(&self, outcome: &ExtractionOutcome) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(&outcome_json(outcome))?);
        }
        Ok(self.outcome_line(outcome))
    }

    /// Format a backfill: first batch outcomes plus the totals so far.
    pub fn format_backfill(
        &self,
        first_batch: &[ExtractionOutcome],
        report: &BackfillReport,
    ) -> Result<String> {
        if self.format == OutputFormat::Json {
            let value = json!({
                "first_batch": first_batch.iter().map(outcome_json).collect::<Vec<_>>(),
                "report": report_json(report),
            });
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        let mut lines: Vec<String> = first_batch.iter().map(|o| self.outcome_line(o)).collect();
        let summary = format!(
            "{}/{} documents processed: {} succeeded, {} failed, {} requirement(s) created, {} skipped",
            report.processed,
            report.total,
            report.succeeded,
            report.failed,
            report.requirements_created,
            report.requirements_skipped
        );
        lines.push(if report.finished {
            self.success(&summary)
        } else {
            self.info(&format!(
                "{} ({} remaining in background)",
                summary,
                report.remaining()
            ))
        });
        Ok(lines.join("\n"))
    }

    /// Format the outcome of a project run.
    pub fn format_run(&self, outcome: &RunnerOutcome) -> Result<String> {
        if self.format == OutputFormat::Json {
            let value = match outcome {
                RunnerOutcome::Completed { job_id, outcomes } => json!({
                    "job_id": job_id.to_string(),
                    "state": "completed",
                    "outcomes": outcomes.iter().map(outcome_json).collect::<Vec<_>>(),
                }),
                RunnerOutcome::Paused { job_id, cursor } => json!({
                    "job_id": job_id.to_string(),
                    "state": "paused",
                    "cursor": cursor,
                }),
                RunnerOutcome::Cancelled { job_id, cursor } => json!({
                    "job_id": job_id.to_string(),
                    "state": "cancelled",
                    "cursor": cursor,
                }),
                RunnerOutcome::Waiting { job_id, holder } => json!({
                    "job_id": job_id.to_string(),
                    "state": "waiting",
                    "holder": holder.to_string(),
                }),
            };
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        Ok(match outcome {
            RunnerOutcome::Completed { job_id, outcomes } => {
                let mut lines: Vec<String> = outcomes.iter().map(|o| self.outcome_line(o)).collect();
                lines.push(self.success(&format!(
                    "Job {} completed ({} document(s))",
                    job_id,
                    outcomes.len()
                )));
                lines.join("\n")
            }
            RunnerOutcome::Paused { job_id, cursor } => self.warning(&format!(
                "Job {} paused at document {}; run again to resume",
                job_id, cursor
            )),
            RunnerOutcome::Cancelled { job_id, cursor } => {
                self.warning(&format!("Job {} cancelled at document {}", job_id, cursor))
            }
            RunnerOutcome::Waiting { job_id, holder } => self.warning(&format!(
                "Job {} waiting: project is busy with job {}",
                job_id, holder
            )),
        })
    }

    /// Format jobs.
    pub fn format_jobs(&self, jobs: &[Job]) -> Result<String> {
        if self.format == OutputFormat::Json {
            let values: Vec<Value> = jobs
                .iter()
                .map(|j| {
                    json!({
                        "id": j.id.to_string(),
                        "project_id": j.project_id.as_str(),
                        "type": j.job_type.as_str(),
                        "status": j.status.as_str(),
                        "cursor": j.current_document_index,
                        "documents": j.document_ids.len(),
                        "error": j.error,
                        "created_at": j.created_at,
                        "completed_at": j.completed_at,
                    })
                })
                .collect();
            return Ok(serde_json::to_string_pretty(&values)?);
        }

        if jobs.is_empty() {
            return Ok(self.colorize("No jobs found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Project", "Type", "Status", "Progress"]);
        for job in jobs {
            let id = job.id.to_string();
            let progress = format!("{}/{}", job.current_document_index, job.document_ids.len());
            builder.push_record([
                id.as_str(),
                job.project_id.as_str(),
                job.job_type.as_str(),
                job.status.as_str(),
                &progress,
            ]);
        }
        Ok(self.render(builder))
    }

    fn outcome_line(&self, outcome: &ExtractionOutcome) -> String {
        if outcome.success {
            self.success(&format!(
                "{}: {} requirement(s) created, {} skipped",
                outcome.document_id, outcome.requirements_created, outcome.requirements_skipped
            ))
        } else {
            self.error(&format!(
                "{}: {}",
                outcome.document_id,
                outcome.error.as_deref().unwrap_or("failed")
            ))
        }
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    fn colorize_status(&self, status: &str) -> String {
        match status {
            "DONE" => self.colorize(status, "green"),
            "ERROR" => self.colorize(status, "red"),
            "PROCESSING" => self.colorize(status, "cyan"),
            "WAITING" => self.colorize(status, "yellow"),
            _ => status.to_string(),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn requirement_json(r: &Requirement) -> Value {
    json!({
        "id": r.id.to_string(),
        "project_id": r.project_id.as_str(),
        "document_id": r.document_id.as_str(),
        "code": r.code,
        "title": r.title,
        "description": r.description,
        "category": r.category,
        "priority": r.priority.as_str(),
        "status": r.status.as_str(),
        "source_page": r.source_page,
        "source_quote": r.source_quote,
        "content_hash": r.content_hash,
        "created_at": r.created_at,
    })
}

fn outcome_json(o: &ExtractionOutcome) -> Value {
    json!({
        "document_id": o.document_id.as_str(),
        "success": o.success,
        "requirements_created": o.requirements_created,
        "requirements_skipped": o.requirements_skipped,
        "error": o.error,
        "model": o.model,
        "input_tokens": o.input_tokens,
        "output_tokens": o.output_tokens,
    })
}

fn report_json(r: &BackfillReport) -> Value {
    json!({
        "total": r.total,
        "processed": r.processed,
        "succeeded": r.succeeded,
        "failed": r.failed,
        "requirements_created": r.requirements_created,
        "requirements_skipped": r.requirements_skipped,
        "failures": r.failures.iter().map(|f| json!({
            "document_id": f.document_id.as_str(),
            "error": f.error,
        })).collect::<Vec<_>>(),
        "finished": r.finished,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use redyce_domain::{
        content_hash, DocumentId, ExtractionStatus, ProjectId, RequirementId,
        RequirementPriority, RequirementStatus,
    };

    fn requirement() -> Requirement {
        let project_id = ProjectId::new("ao-17");
        let document_id = DocumentId::new("cctp");
        Requirement {
            id: RequirementId::new(),
            content_hash: content_hash(&project_id, &document_id, "Visite obligatoire"),
            project_id,
            document_id,
            code: Some("Art. 2".to_string()),
            title: "Visite obligatoire".to_string(),
            description: "Visite du site avant remise des offres".to_string(),
            category: None,
            priority: RequirementPriority::High,
            status: RequirementStatus::ATraiter,
            source_page: Some(4),
            source_quote: None,
            created_at: 1_700_000_000,
        }
    }

    fn summary(status: Option<ExtractionStatus>) -> DocumentSummary {
        DocumentSummary {
            id: DocumentId::new("cctp"),
            project_id: ProjectId::new("ao-17"),
            name: "cctp.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            requirement_status: status,
            requirement_processed_at: None,
            requirement_error_message: None,
        }
    }

    #[test]
    fn test_requirements_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_requirements(&[requirement()]).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["priority"], "HIGH");
        assert_eq!(parsed[0]["status"], "A_TRAITER");
        assert_eq!(parsed[0]["source_page"], 4);
    }

    #[test]
    fn test_requirements_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_requirements(&[requirement()]).unwrap();
        assert!(output.contains("Title"));
        assert!(output.contains("Visite obligatoire"));
    }

    #[test]
    fn test_empty_documents() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_documents(&[]).unwrap();
        assert!(output.contains("No documents found"));
    }

    #[test]
    fn test_documents_table_shows_status() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter
            .format_documents(&[summary(Some(ExtractionStatus::Waiting)), summary(None)])
            .unwrap();
        assert!(output.contains("WAITING"));
        assert!(output.contains("-"));
    }

    #[test]
    fn test_backfill_summary() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let report = BackfillReport {
            total: 4,
            processed: 2,
            succeeded: 2,
            ..BackfillReport::default()
        };
        let output = formatter.format_backfill(&[], &report).unwrap();
        assert!(output.contains("2/4 documents processed"));
        assert!(output.contains("2 remaining in background"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
