//! Where the changed files come from.
//!
//! [`GitDiffSource`] asks the local git checkout, [`PatchDiffSource`] splits
//! an existing unified diff. Both read the full file text from the working
//! tree, which in CI is the pull request head.

use std::path::{Path, PathBuf};
use std::process::Command;

use sieve_core::{ReviewRequest, SieveError};
use sieve_difflens::parser::parse_unified_diff;

/// Produces one [`ReviewRequest`] per changed file.
pub trait DiffSource {
    /// # Errors
    ///
    /// Returns [`SieveError::Git`] or [`SieveError::Parse`] when the change
    /// set cannot be determined at all. Individual unreadable files are
    /// skipped instead.
    fn changed_files(&self) -> Result<Vec<ReviewRequest>, SieveError>;
}

/// Diff between two refs of a local repository, via the `git` CLI.
///
/// A ref that does not resolve locally is retried on the first configured
/// remote, so `main` works in a CI checkout that only has `origin/main`.
#[derive(Debug, Clone)]
pub struct GitDiffSource {
    repo_root: PathBuf,
    base: String,
    head: String,
}

impl GitDiffSource {
    pub fn new(repo_root: impl Into<PathBuf>, base: impl Into<String>, head: impl Into<String>) -> Self {
        Self {
            repo_root: repo_root.into(),
            base: base.into(),
            head: head.into(),
        }
    }

    fn git(&self, args: &[&str]) -> Result<String, SieveError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .args(args)
            .output()
            .map_err(|e| SieveError::Git(format!("failed to run git: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SieveError::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Name of the remote to fall back to, `origin` unless the repository
    /// has a different single remote.
    fn remote(&self) -> String {
        self.git(&["remote"])
            .ok()
            .and_then(|out| out.lines().next().map(|l| l.trim().to_string()))
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "origin".to_string())
    }

    fn resolve(&self, reference: &str) -> Result<String, SieveError> {
        let verify = |r: &str| self.git(&["rev-parse", "--verify", "--quiet", &format!("{r}^{{commit}}")]);
        if verify(reference).is_ok() {
            return Ok(reference.to_string());
        }
        let remote_ref = format!("{}/{reference}", self.remote());
        verify(&remote_ref)
            .map(|_| remote_ref)
            .map_err(|_| SieveError::Git(format!("unknown revision '{reference}'")))
    }
}

impl DiffSource for GitDiffSource {
    fn changed_files(&self) -> Result<Vec<ReviewRequest>, SieveError> {
        let base = self.resolve(&self.base)?;
        let head = self.resolve(&self.head)?;
        tracing::debug!(%base, %head, "listing changed files");

        let names = self.git(&["diff", "--name-only", "--diff-filter=d", &base, &head])?;
        let mut requests = Vec::new();
        for path in names.lines().map(str::trim).filter(|p| !p.is_empty()) {
            let diff = self.git(&["diff", &base, &head, "--", path])?;
            if diff.trim().is_empty() {
                continue;
            }
            let Some(text) = read_file_text(&self.repo_root, path) else {
                continue;
            };
            requests.push(ReviewRequest::new(path, text, diff));
        }
        Ok(requests)
    }
}

/// Files of an existing unified diff, such as a downloaded `.diff` of a pull
/// request.
#[derive(Debug, Clone)]
pub struct PatchDiffSource {
    repo_root: PathBuf,
    diff_text: String,
}

impl PatchDiffSource {
    pub fn new(repo_root: impl Into<PathBuf>, diff_text: impl Into<String>) -> Self {
        Self {
            repo_root: repo_root.into(),
            diff_text: diff_text.into(),
        }
    }
}

impl DiffSource for PatchDiffSource {
    fn changed_files(&self) -> Result<Vec<ReviewRequest>, SieveError> {
        let mut requests = Vec::new();
        for file in parse_unified_diff(&self.diff_text)? {
            if !file.is_reviewable() {
                tracing::debug!(file = file.path(), "skipping binary, deleted or empty diff");
                continue;
            }
            let path = file.path().to_string();
            let Some(text) = read_file_text(&self.repo_root, &path) else {
                continue;
            };
            requests.push(ReviewRequest::new(path, text, file.text));
        }
        Ok(requests)
    }
}

fn read_file_text(root: &Path, path: &str) -> Option<String> {
    match std::fs::read_to_string(root.join(path)) {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            tracing::debug!(file = path, "skipping empty file");
            None
        }
        Err(e) => {
            tracing::warn!(file = path, error = %e, "skipping unreadable file");
            None
        }
    }
}
