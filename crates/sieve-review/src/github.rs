use async_trait::async_trait;
use serde_json::{json, Value};
use sieve_core::{LineTarget, PostedCommentRecord, PullRequest, SieveError};

use crate::host::ReviewHost;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const PER_PAGE: usize = 100;

/// GitHub client bound to a single pull request.
///
/// Implements [`ReviewHost`] over the REST API:
/// conversation comments go through the issues endpoints, line comments
/// through the pull request review comment endpoints.
///
/// # Examples
///
/// ```
/// use sieve_review::github::parse_pr_reference;
///
/// let (owner, repo, number) = parse_pr_reference("rust-lang/rust#12345").unwrap();
/// assert_eq!(owner, "rust-lang");
/// assert_eq!(repo, "rust");
/// assert_eq!(number, 12345);
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
    api_base: String,
    owner: String,
    repo: String,
    number: u64,
}

impl GitHubClient {
    /// Create a client for `owner/repo#number`.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::Config`] if the API base URL is invalid or the
    /// client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sieve_review::github::GitHubClient;
    ///
    /// let client = GitHubClient::new("ghp_xxxx", None, "octocat", "hello-world", 42).unwrap();
    /// ```
    pub fn new(
        token: &str,
        api_base: Option<&str>,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Self, SieveError> {
        let api_base = api_base
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
            .to_string();

        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_base.as_str())
            .map_err(|e| SieveError::Config(format!("invalid GitHub API base '{api_base}': {e}")))?
            .build()
            .map_err(|e| SieveError::Config(format!("failed to create GitHub client: {e}")))?;

        Ok(Self {
            octocrab,
            http: reqwest::Client::new(),
            token: token.to_string(),
            api_base,
            owner: owner.to_string(),
            repo: repo.to_string(),
            number,
        })
    }

    /// `owner/repo#number` of the bound pull request.
    pub fn reference(&self) -> String {
        format!("{}/{}#{}", self.owner, self.repo, self.number)
    }

    fn repo_route(&self, rest: &str) -> String {
        format!("/repos/{}/{}/{rest}", self.owner, self.repo)
    }

    /// Fetch the unified diff for the pull request.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::Repository`] on network or API errors.
    pub async fn get_pr_diff(&self) -> Result<String, SieveError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_base, self.owner, self.repo, self.number
        );

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github.v3.diff")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "sieve")
            .send()
            .await
            .map_err(|e| SieveError::Repository(format!("failed to fetch PR diff: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SieveError::Repository(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| SieveError::Repository(format!("failed to read diff response: {e}")))
    }

    async fn get_all_pages(&self, route: &str) -> Result<Vec<Value>, SieveError> {
        let mut all = Vec::new();
        for page in 1.. {
            let paged = format!("{route}?per_page={PER_PAGE}&page={page}");
            let items: Vec<Value> = self
                .octocrab
                .get(paged, None::<&()>)
                .await
                .map_err(|e| repository_error("list comments", e))?;
            let done = items.len() < PER_PAGE;
            all.extend(items);
            if done {
                break;
            }
        }
        Ok(all)
    }
}

fn repository_error(action: &str, e: octocrab::Error) -> SieveError {
    SieveError::Repository(format!("failed to {action}: {e}"))
}

fn comment_id(response: &Value) -> Result<u64, SieveError> {
    response
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| SieveError::Repository("response has no comment id".into()))
}

/// Convert an issue comment or review comment JSON object.
fn record_from_json(value: &Value, with_target: bool) -> Option<PostedCommentRecord> {
    let id = value.get("id")?.as_u64()?;
    let body = value.get("body").and_then(Value::as_str).unwrap_or_default();
    let author = value
        .pointer("/user/login")
        .and_then(Value::as_str)
        .map(str::to_string);
    let target = if with_target {
        let file_path = value.get("path").and_then(Value::as_str)?.to_string();
        let line = value
            .get("line")
            .and_then(Value::as_u64)
            .or_else(|| value.get("original_line").and_then(Value::as_u64))
            .and_then(|l| u32::try_from(l).ok())
            .unwrap_or(0);
        Some(LineTarget { file_path, line })
    } else {
        None
    };
    Some(PostedCommentRecord {
        id,
        body: body.to_string(),
        author,
        target,
    })
}

fn pull_request_from_json(value: &Value) -> Option<PullRequest> {
    Some(PullRequest {
        number: value.get("number")?.as_u64()?,
        body: value
            .get("body")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        head_sha: value.pointer("/head/sha")?.as_str()?.to_string(),
        base_ref: value.pointer("/base/ref")?.as_str()?.to_string(),
    })
}

#[async_trait]
impl ReviewHost for GitHubClient {
    async fn get_comments(&self) -> Result<Vec<PostedCommentRecord>, SieveError> {
        let issue_route = self.repo_route(&format!("issues/{}/comments", self.number));
        let review_route = self.repo_route(&format!("pulls/{}/comments", self.number));

        let mut records: Vec<PostedCommentRecord> = self
            .get_all_pages(&issue_route)
            .await?
            .iter()
            .filter_map(|v| record_from_json(v, false))
            .collect();
        records.extend(
            self.get_all_pages(&review_route)
                .await?
                .iter()
                .filter_map(|v| record_from_json(v, true)),
        );
        tracing::debug!(pr = %self.reference(), count = records.len(), "fetched existing comments");
        Ok(records)
    }

    async fn post_comment_general(&self, body: &str) -> Result<u64, SieveError> {
        let route = self.repo_route(&format!("issues/{}/comments", self.number));
        let response: Value = self
            .octocrab
            .post(route, Some(&json!({ "body": body })))
            .await
            .map_err(|e| repository_error("post comment", e))?;
        comment_id(&response)
    }

    async fn post_comment_to_line(
        &self,
        body: &str,
        commit_id: &str,
        file_path: &str,
        line: u32,
    ) -> Result<u64, SieveError> {
        let route = self.repo_route(&format!("pulls/{}/comments", self.number));
        let payload = json!({
            "body": body,
            "commit_id": commit_id,
            "path": file_path,
            "line": line,
            "side": "RIGHT",
        });
        let response: Value = self
            .octocrab
            .post(route, Some(&payload))
            .await
            .map_err(|e| repository_error("post line comment", e))?;
        comment_id(&response)
    }

    async fn update_comment(&self, id: u64, body: &str) -> Result<(), SieveError> {
        let route = self.repo_route(&format!("issues/comments/{id}"));
        let _response: Value = self
            .octocrab
            .patch(route, Some(&json!({ "body": body })))
            .await
            .map_err(|e| repository_error("update comment", e))?;
        Ok(())
    }

    async fn get_pull_request(&self) -> Result<PullRequest, SieveError> {
        let route = self.repo_route(&format!("pulls/{}", self.number));
        let response: Value = self
            .octocrab
            .get(route, None::<&()>)
            .await
            .map_err(|e| repository_error("fetch pull request", e))?;
        pull_request_from_json(&response).ok_or_else(|| {
            SieveError::Repository(format!("unexpected pull request payload for {}", self.reference()))
        })
    }

    async fn update_pull_request(&self, body: &str) -> Result<(), SieveError> {
        let route = self.repo_route(&format!("pulls/{}", self.number));
        let _response: Value = self
            .octocrab
            .patch(route, Some(&json!({ "body": body })))
            .await
            .map_err(|e| repository_error("update pull request", e))?;
        Ok(())
    }
}

/// Parse a PR reference string (`owner/repo#number`) into its components.
///
/// # Errors
///
/// Returns [`SieveError::Config`] if the format is invalid.
///
/// # Examples
///
/// ```
/// use sieve_review::github::parse_pr_reference;
///
/// let (owner, repo, num) = parse_pr_reference("octocat/hello-world#42").unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(repo, "hello-world");
/// assert_eq!(num, 42);
/// ```
pub fn parse_pr_reference(pr_ref: &str) -> Result<(String, String, u64), SieveError> {
    let invalid = || {
        SieveError::Config(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        ))
    };
    let (owner_repo, number_str) = pr_ref.split_once('#').ok_or_else(invalid)?;
    let (owner, repo) = owner_repo.split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() {
        return Err(invalid());
    }
    let number: u64 = number_str
        .parse()
        .map_err(|_| SieveError::Config(format!("invalid PR number: {number_str}")))?;
    Ok((owner.to_string(), repo.to_string(), number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_pr_reference() {
        let (owner, repo, num) = parse_pr_reference("rust-lang/rust#12345").unwrap();
        assert_eq!(owner, "rust-lang");
        assert_eq!(repo, "rust");
        assert_eq!(num, 12345);
    }

    #[test]
    fn parse_pr_reference_rejects_malformed() {
        for bad in ["owner/repo", "repo#123", "owner/repo#abc", "/repo#1", "owner/#1"] {
            let err = parse_pr_reference(bad).unwrap_err();
            assert!(matches!(err, SieveError::Config(_)), "{bad}");
        }
    }

    #[test]
    fn issue_comment_json_has_no_target() {
        let v = json!({ "id": 5, "body": "hi", "user": { "login": "octocat" } });
        let r = record_from_json(&v, false).unwrap();
        assert_eq!(r.id, 5);
        assert_eq!(r.author.as_deref(), Some("octocat"));
        assert!(r.target.is_none());
    }

    #[test]
    fn review_comment_json_falls_back_to_original_line() {
        let v = json!({
            "id": 9, "body": "x", "path": "src/a.rs",
            "line": null, "original_line": 14,
            "user": { "login": "bot" }
        });
        let r = record_from_json(&v, true).unwrap();
        assert_eq!(
            r.target,
            Some(LineTarget {
                file_path: "src/a.rs".into(),
                line: 14
            })
        );
    }

    #[test]
    fn null_body_reads_as_empty() {
        let v = json!({ "id": 1, "body": null });
        assert_eq!(record_from_json(&v, false).unwrap().body, "");
    }

    #[test]
    fn pull_request_json() {
        let v = json!({
            "number": 42,
            "body": null,
            "head": { "sha": "abc" },
            "base": { "ref": "main" }
        });
        let pr = pull_request_from_json(&v).unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.body, "");
        assert_eq!(pr.head_sha, "abc");
        assert_eq!(pr.base_ref, "main");
    }

    #[tokio::test]
    async fn client_trims_api_base() {
        let client =
            GitHubClient::new("t", Some("https://ghe.example.com/api/v3/"), "o", "r", 7).unwrap();
        assert_eq!(client.reference(), "o/r#7");
        assert_eq!(client.api_base, "https://ghe.example.com/api/v3");
        assert_eq!(client.repo_route("pulls/7"), "/repos/o/r/pulls/7");
    }
}
