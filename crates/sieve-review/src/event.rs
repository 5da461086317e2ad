//! Which pull request a CI run is about.

use std::path::Path;

use serde_json::Value;
use sieve_core::{Env, SieveError};

use crate::github::parse_pr_reference;

/// The pull request a run reviews, and the two revisions it compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestContext {
    pub owner: String,
    pub repo: String,
    pub number: u64,
    /// Target branch name, e.g. `main`.
    pub base_ref: String,
    /// Commit line comments are attached to.
    pub head_sha: String,
}

impl PullRequestContext {
    /// Read the context from a GitHub Actions environment.
    ///
    /// Returns `Ok(None)` when the workflow was not triggered by a pull
    /// request event, or when `GITHUB_EVENT_NAME` is unset.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::Config`] if the event payload is missing or
    /// lacks pull request fields.
    pub fn from_actions_env(env: &Env) -> Result<Option<Self>, SieveError> {
        let Some(event_name) = env.get("GITHUB_EVENT_NAME") else {
            return Ok(None);
        };
        if !matches!(event_name.as_str(), "pull_request" | "pull_request_target") {
            tracing::info!(event = %event_name, "not a pull request event");
            return Ok(None);
        }
        let path = env
            .get("GITHUB_EVENT_PATH")
            .ok_or_else(|| SieveError::Config("GITHUB_EVENT_PATH is not set".into()))?;
        Self::from_event_file(Path::new(&path)).map(Some)
    }

    /// Parse a `pull_request` webhook payload from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::Config`] if the file cannot be read or is not a
    /// pull request payload, and [`SieveError::Serialization`] if it is not
    /// JSON.
    pub fn from_event_file(path: &Path) -> Result<Self, SieveError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SieveError::Config(format!("cannot read event payload {}: {e}", path.display()))
        })?;
        let value: Value = serde_json::from_str(&content)?;
        Self::from_event(&value)
    }

    /// # Errors
    ///
    /// Returns [`SieveError::Config`] naming the first missing field.
    pub fn from_event(event: &Value) -> Result<Self, SieveError> {
        let field = |pointer: &str| -> Result<&Value, SieveError> {
            event
                .pointer(pointer)
                .filter(|v| !v.is_null())
                .ok_or_else(|| SieveError::Config(format!("event payload has no {pointer}")))
        };
        let text = |pointer: &str| -> Result<String, SieveError> {
            field(pointer)?
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| SieveError::Config(format!("event field {pointer} is not a string")))
        };

        let number = field("/pull_request/number")?
            .as_u64()
            .or_else(|| event.get("number").and_then(Value::as_u64))
            .ok_or_else(|| SieveError::Config("event pull request number is not a number".into()))?;

        Ok(Self {
            owner: text("/pull_request/base/repo/owner/login")?,
            repo: text("/pull_request/base/repo/name")?,
            number,
            base_ref: text("/pull_request/base/ref")?,
            head_sha: text("/pull_request/head/sha")?,
        })
    }

    /// Build a context from `owner/repo#N` plus revisions looked up elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::Config`] for a malformed reference.
    pub fn from_reference(
        reference: &str,
        base_ref: impl Into<String>,
        head_sha: impl Into<String>,
    ) -> Result<Self, SieveError> {
        let (owner, repo, number) = parse_pr_reference(reference)?;
        Ok(Self {
            owner,
            repo,
            number,
            base_ref: base_ref.into(),
            head_sha: head_sha.into(),
        })
    }

    pub fn reference(&self) -> String {
        format!("{}/{}#{}", self.owner, self.repo, self.number)
    }
}
