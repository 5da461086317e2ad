//! One review run over a change set.
//!
//! Files are handled strictly one after the other. A failure on one file is
//! recorded in its [`FileReport`] and the run moves on; only the summary
//! write at the end touches the pull request as a whole.

use std::fmt;

use serde::Serialize;
use sieve_core::{
    CommentBatch, LineComment, PublishOutcome, PublishTarget, ReviewConfig, ReviewRequest,
    SieveConfig, SummaryConfig,
};
use sieve_difflens::filter::PathFilter;

use crate::host::ReviewHost;
use crate::llm::ReviewModel;
use crate::prompt::{PromptBuilder, PromptTemplate};
use crate::render::CommentRenderer;
use crate::speculative::SpeculativeFilter;
use crate::{dedup, parser, publish, sentinel, summary};

/// Posted once for a file whose reply was the no-issues phrase.
pub const NO_ISSUES_ACK: &str = "AI review: ✅ No issues detected in this file.";

/// Posted when the model ran out of output tokens.
pub const TRUNCATED_NOTICE: &str =
    "AI review: ⚠️ The model reply was cut off, so findings for this file may be incomplete.";

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "lowercase")]
pub enum FileStatus {
    /// The model reported findings.
    Reviewed,
    /// The model answered with the no-issues phrase.
    Clean,
    Skipped(String),
    /// The model call failed.
    Failed(String),
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Reviewed => write!(f, "reviewed"),
            FileStatus::Clean => write!(f, "clean"),
            FileStatus::Skipped(reason) => write!(f, "skipped ({reason})"),
            FileStatus::Failed(msg) => write!(f, "failed ({msg})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: String,
    pub status: FileStatus,
    /// Findings left after parsing and filtering, before deduplication.
    pub found: usize,
    pub posted: usize,
    pub failed: usize,
    /// Whether the model reply was truncated.
    pub truncated: bool,
}

impl FileReport {
    fn new(path: &str, status: FileStatus) -> Self {
        Self {
            path: path.to_string(),
            status,
            found: 0,
            posted: 0,
            failed: 0,
            truncated: false,
        }
    }

    fn record(&mut self, outcome: PublishOutcome) {
        self.posted += outcome.posted;
        self.failed += outcome.failed;
    }
}

/// Result of [`ReviewPipeline::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub files: Vec<FileReport>,
    /// Set when the summary could not be written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_error: Option<String>,
}

impl RunReport {
    pub fn reviewed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Reviewed | FileStatus::Clean))
            .count()
    }

    pub fn found(&self) -> usize {
        self.files.iter().map(|f| f.found).sum()
    }

    pub fn posted(&self) -> usize {
        self.files.iter().map(|f| f.posted).sum()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().map(|f| f.failed).sum()
    }

    /// Files whose model call failed.
    pub fn errors(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Failed(_)))
            .count()
    }

    /// Markdown body of the summary block.
    ///
    /// Contains no timestamps or run ids, so an unchanged change set renders
    /// byte-for-byte the same and the upsert leaves the document alone.
    pub fn summary_markdown(&self, heading: &str) -> String {
        let mut out = format!("## {heading}\n\n");
        let considered: Vec<&FileReport> = self
            .files
            .iter()
            .filter(|f| !matches!(f.status, FileStatus::Skipped(_)))
            .collect();
        if considered.is_empty() {
            out.push_str("No reviewable files in this change set.\n");
            return out;
        }
        out.push_str(&format!(
            "Reviewed {} file(s): {} finding(s).\n\n",
            self.reviewed(),
            self.found()
        ));
        out.push_str("| File | Result | Findings |\n|------|--------|----------|\n");
        for file in considered {
            let result = match &file.status {
                FileStatus::Reviewed => "issues found",
                FileStatus::Clean => "no issues",
                FileStatus::Failed(_) => "review failed",
                FileStatus::Skipped(_) => continue,
            };
            out.push_str(&format!("| `{}` | {result} | {} |\n", file.path, file.found));
        }
        out
    }

    /// Full report for `--format markdown`.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Sieve Review\n\n");
        out.push_str(&format!(
            "**{} file(s)** reviewed, **{}** finding(s), **{}** comment(s) posted, **{}** failed\n\n",
            self.reviewed(),
            self.found(),
            self.posted(),
            self.failed()
        ));
        out.push_str("| File | Status | Found | Posted | Failed |\n");
        out.push_str("|------|--------|-------|--------|--------|\n");
        for f in &self.files {
            out.push_str(&format!(
                "| `{}` | {} | {} | {} | {} |\n",
                f.path, f.status, f.found, f.posted, f.failed
            ));
        }
        if let Some(err) = &self.summary_error {
            out.push_str(&format!("\n> Summary not updated: {err}\n"));
        }
        out
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            write!(f, "{}: {}", file.path, file.status)?;
            if matches!(file.status, FileStatus::Reviewed | FileStatus::Clean) {
                write!(
                    f,
                    ", {} found, {} posted, {} failed",
                    file.found, file.posted, file.failed
                )?;
            }
            if file.truncated {
                write!(f, " [truncated]")?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "{} file(s) reviewed, {} finding(s), {} posted, {} failed",
            self.reviewed(),
            self.found(),
            self.posted(),
            self.failed()
        )?;
        if let Some(err) = &self.summary_error {
            write!(f, "\nsummary not updated: {err}")?;
        }
        Ok(())
    }
}

/// Drives prompt, model, parser, dedup and publisher for each file.
///
/// # Examples
///
/// ```no_run
/// # async fn run(model: &dyn sieve_review::llm::ReviewModel) {
/// use sieve_core::{ReviewRequest, SieveConfig};
/// use sieve_review::host::DryRunHost;
/// use sieve_review::pipeline::ReviewPipeline;
///
/// let host = DryRunHost::new(None);
/// let config = SieveConfig::default();
/// let pipeline = ReviewPipeline::new(&config, model, &host, "deadbeef");
/// let report = pipeline
///     .run(vec![ReviewRequest::new("a.py", "x = 1\n", "+x = 1")])
///     .await;
/// println!("{report}");
/// # }
/// ```
pub struct ReviewPipeline<'a> {
    model: &'a dyn ReviewModel,
    host: &'a dyn ReviewHost,
    prompts: PromptBuilder,
    paths: PathFilter,
    speculative: SpeculativeFilter,
    review: ReviewConfig,
    summary: SummaryConfig,
    commit_id: String,
    on_file: Option<Box<dyn Fn(&str) + Send + Sync + 'a>>,
}

impl<'a> ReviewPipeline<'a> {
    pub fn new(
        config: &SieveConfig,
        model: &'a dyn ReviewModel,
        host: &'a dyn ReviewHost,
        commit_id: impl Into<String>,
    ) -> Self {
        Self {
            model,
            host,
            prompts: PromptBuilder::new(PromptTemplate::from_config(&config.review)),
            paths: PathFilter::from_config(&config.review),
            speculative: SpeculativeFilter::new(config.review.drop_speculative),
            review: config.review.clone(),
            summary: config.summary.clone(),
            commit_id: commit_id.into(),
            on_file: None,
        }
    }

    /// Call `f` with each file path before it is reviewed.
    pub fn on_file(mut self, f: impl Fn(&str) + Send + Sync + 'a) -> Self {
        self.on_file = Some(Box::new(f));
        self
    }

    /// Review every request, then refresh the summary block.
    pub async fn run(&self, requests: Vec<ReviewRequest>) -> RunReport {
        let mut report = RunReport::default();
        for request in &requests {
            if let Some(f) = &self.on_file {
                f(&request.file_path);
            }
            report.files.push(self.review_file(request).await);
        }

        if self.summary.enabled {
            let body = report.summary_markdown(&self.summary.heading);
            if let Err(e) = summary::publish_summary(self.host, &self.summary, &body).await {
                tracing::warn!(error = %e, "failed to update summary");
                report.summary_error = Some(e.to_string());
            }
        }
        report
    }

    async fn review_file(&self, request: &ReviewRequest) -> FileReport {
        let path = request.file_path.as_str();
        if !request.has_changes() {
            tracing::debug!(file = path, "no diff, skipping");
            return FileReport::new(path, FileStatus::Skipped("no changes".into()));
        }
        if let Some(reason) = self.paths.check(path) {
            tracing::info!(file = path, %reason, "skipping");
            return FileReport::new(path, FileStatus::Skipped(reason.to_string()));
        }

        tracing::info!(
            file = path,
            content_len = request.file_text.len(),
            diff_len = request.diff_text.len(),
            "reviewing"
        );
        let completion = match self.model.complete(self.prompts.build(request)).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(file = path, error = %e, "model call failed");
                return FileReport::new(path, FileStatus::Failed(e.to_string()));
            }
        };

        let renderer =
            CommentRenderer::new(path, &request.file_text, self.review.snippet_context_lines);
        let target = PublishTarget {
            commit_id: self.commit_id.clone(),
            file_path: path.to_string(),
        };
        let phrase = self.prompts.template().no_issues_phrase.as_str();

        let mut report = FileReport::new(path, FileStatus::Reviewed);
        let mut notices = CommentBatch::new();
        if completion.truncated {
            tracing::warn!(file = path, "model reply was truncated");
            report.truncated = true;
            notices.push(LineComment::unanchored(TRUNCATED_NOTICE));
        }

        let findings = if sentinel::is_phrase(Some(completion.content.as_str()), phrase) {
            tracing::info!(file = path, "no issues found");
            report.status = FileStatus::Clean;
            if self.review.post_no_issues {
                notices.push(LineComment::unanchored(NO_ISSUES_ACK));
            }
            CommentBatch::new()
        } else {
            let parsed = parser::parse_with_phrase(
                Some(completion.content.as_str()),
                request.max_line_number(),
                phrase,
            );
            self.speculative.apply(parsed)
        };
        report.found = findings.len();

        let mut batch = notices;
        batch.extend(findings);
        if batch.is_empty() {
            return report;
        }

        let existing = match self.host.get_comments().await {
            Ok(comments) => comments,
            Err(e) => {
                tracing::warn!(file = path, error = %e, "could not list existing comments");
                Vec::new()
            }
        };
        let batch = dedup::filter(batch, &existing, &renderer);
        report.record(publish::publish(&batch, &target, self.host, &renderer).await);
        report
    }
}
