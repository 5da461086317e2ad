use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One changed file handed to the reviewer.
///
/// Created once per file per run and discarded after its response has been
/// parsed.
///
/// # Examples
///
/// ```
/// use sieve_core::ReviewRequest;
///
/// let req = ReviewRequest::new("src/db.py", "import os\nquery = input()\n", "+query = input()");
/// assert_eq!(req.max_line_number(), 2);
/// assert_eq!(req.extension(), Some("py"));
/// assert!(req.has_changes());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    /// Path relative to the repository root.
    pub file_path: String,
    /// Full text of the file at the head revision.
    pub file_text: String,
    /// Unified diff for this file; empty means "skip".
    pub diff_text: String,
}

impl ReviewRequest {
    pub fn new(
        file_path: impl Into<String>,
        file_text: impl Into<String>,
        diff_text: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            file_text: file_text.into(),
            diff_text: diff_text.into(),
        }
    }

    /// Highest line number a comment may be anchored to.
    pub fn max_line_number(&self) -> u32 {
        u32::try_from(self.file_text.lines().count()).unwrap_or(u32::MAX)
    }

    /// Whether the diff carries anything to review.
    pub fn has_changes(&self) -> bool {
        !self.diff_text.trim().is_empty()
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_path.rsplit('/').next()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Some(ext)
    }
}

/// Text returned by the model for one [`ReviewRequest`].
///
/// `truncated` is set when the provider stopped because it ran out of
/// output tokens (`finish_reason == "length"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    pub truncated: bool,
}

impl Completion {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            truncated: false,
        }
    }
}

/// A single normalized finding extracted from a model response.
///
/// `line == 0` means the comment is not tied to a line. The body always
/// carries the bracketed severity/category prefixes, so it is exactly the
/// text that gets published.
///
/// # Examples
///
/// ```
/// use sieve_core::LineComment;
///
/// let c = LineComment::unanchored("General remark.");
/// assert!(!c.is_anchored());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineComment {
    /// 1-based line in the reviewed file, or 0 when unanchored.
    pub line: u32,
    /// Issue category such as `Security` or `Logic`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Severity label as written by the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Normalized comment text.
    pub body: String,
}

impl LineComment {
    pub fn unanchored(body: impl Into<String>) -> Self {
        Self {
            line: 0,
            category: None,
            severity: None,
            body: body.into(),
        }
    }

    pub fn is_anchored(&self) -> bool {
        self.line > 0
    }
}

/// Comments in the order they appeared in the raw response.
pub type CommentBatch = Vec<LineComment>;

/// File and line a remote comment is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineTarget {
    pub file_path: String,
    pub line: u32,
}

/// A comment that already exists on the pull request.
///
/// Re-read from the host on every run; never stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedCommentRecord {
    pub id: u64,
    pub body: String,
    pub author: Option<String>,
    /// `None` for conversation (issue) comments.
    pub target: Option<LineTarget>,
}

/// The subset of pull request metadata sieve needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub number: u64,
    /// Description markdown; empty when the PR has none.
    pub body: String,
    pub head_sha: String,
    pub base_ref: String,
}

/// Where a file's comments are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    /// Commit the line-anchored comments refer to.
    pub commit_id: String,
    pub file_path: String,
}

/// Counts returned by a publish pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub posted: usize,
    pub failed: usize,
}

impl std::ops::AddAssign for PublishOutcome {
    fn add_assign(&mut self, rhs: Self) {
        self.posted += rhs.posted;
        self.failed += rhs.failed;
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use sieve_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
