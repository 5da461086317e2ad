//! The review host abstraction: where comments and the summary live.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use sieve_core::{PostedCommentRecord, PullRequest, Result};

/// Read and write access to one pull request.
///
/// Every method maps a non-success response to
/// [`SieveError::Repository`](sieve_core::SieveError::Repository). Callers
/// decide whether that is fatal; the publisher never treats it as such.
#[async_trait]
pub trait ReviewHost: Send + Sync {
    /// All comments currently on the pull request, conversation and
    /// line comments alike.
    async fn get_comments(&self) -> Result<Vec<PostedCommentRecord>>;

    /// Post a conversation comment. Returns the new comment id.
    async fn post_comment_general(&self, body: &str) -> Result<u64>;

    /// Post a comment anchored to `line` of `file_path` at `commit_id`.
    ///
    /// Fails when the line is not part of the diff the host knows about.
    async fn post_comment_to_line(
        &self,
        body: &str,
        commit_id: &str,
        file_path: &str,
        line: u32,
    ) -> Result<u64>;

    /// Replace the body of a conversation comment.
    async fn update_comment(&self, id: u64, body: &str) -> Result<()>;

    async fn get_pull_request(&self) -> Result<PullRequest>;

    /// Replace the pull request description.
    async fn update_pull_request(&self, body: &str) -> Result<()>;
}

/// A host that reads from an inner host but only logs writes.
///
/// Used for `--dry-run`. Without an inner host, reads return an empty pull
/// request so the whole pipeline can run offline.
pub struct DryRunHost {
    inner: Option<Box<dyn ReviewHost>>,
    next_id: AtomicU64,
}

impl DryRunHost {
    pub fn new(inner: Option<Box<dyn ReviewHost>>) -> Self {
        Self {
            inner,
            next_id: AtomicU64::new(1),
        }
    }

    fn fake_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl ReviewHost for DryRunHost {
    async fn get_comments(&self) -> Result<Vec<PostedCommentRecord>> {
        match &self.inner {
            Some(host) => host.get_comments().await,
            None => Ok(Vec::new()),
        }
    }

    async fn post_comment_general(&self, body: &str) -> Result<u64> {
        tracing::info!(target: "sieve::dry_run", "would post comment:\n{body}");
        Ok(self.fake_id())
    }

    async fn post_comment_to_line(
        &self,
        body: &str,
        _commit_id: &str,
        file_path: &str,
        line: u32,
    ) -> Result<u64> {
        tracing::info!(target: "sieve::dry_run", "would post on {file_path}:{line}:\n{body}");
        Ok(self.fake_id())
    }

    async fn update_comment(&self, id: u64, body: &str) -> Result<()> {
        tracing::info!(target: "sieve::dry_run", "would update comment {id}:\n{body}");
        Ok(())
    }

    async fn get_pull_request(&self) -> Result<PullRequest> {
        match &self.inner {
            Some(host) => host.get_pull_request().await,
            None => Ok(PullRequest::default()),
        }
    }

    async fn update_pull_request(&self, body: &str) -> Result<()> {
        tracing::info!(target: "sieve::dry_run", "would set PR description:\n{body}");
        Ok(())
    }
}
