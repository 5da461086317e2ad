use std::sync::Mutex;

use async_trait::async_trait;
use sieve_core::{Completion, PostedCommentRecord, PullRequest, Result, SieveConfig, SieveError};
use sieve_core::{LineTarget, SummaryTarget};
use sieve_review::host::ReviewHost;
use sieve_review::llm::{ChatMessage, ReviewModel};
use sieve_review::pipeline::ReviewPipeline;
use sieve_review::source::{DiffSource, PatchDiffSource};

/// Host that accepts line comments only on added lines it was told about.
struct MemoryHost {
    diff_lines: Vec<(String, u32)>,
    comments: Mutex<Vec<PostedCommentRecord>>,
    description: Mutex<String>,
}

impl MemoryHost {
    fn new(diff_lines: &[(&str, u32)]) -> Self {
        Self {
            diff_lines: diff_lines.iter().map(|(f, l)| (f.to_string(), *l)).collect(),
            comments: Mutex::new(Vec::new()),
            description: Mutex::new("Fixes the login bug.\n".into()),
        }
    }

    fn push(&self, body: &str, target: Option<LineTarget>) -> u64 {
        let mut comments = self.comments.lock().unwrap();
        let id = comments.len() as u64 + 1;
        comments.push(PostedCommentRecord {
            id,
            body: body.to_string(),
            author: Some("sieve".into()),
            target,
        });
        id
    }
}

#[async_trait]
impl ReviewHost for MemoryHost {
    async fn get_comments(&self) -> Result<Vec<PostedCommentRecord>> {
        Ok(self.comments.lock().unwrap().clone())
    }

    async fn post_comment_general(&self, body: &str) -> Result<u64> {
        Ok(self.push(body, None))
    }

    async fn post_comment_to_line(
        &self,
        body: &str,
        _commit_id: &str,
        file_path: &str,
        line: u32,
    ) -> Result<u64> {
        if !self.diff_lines.contains(&(file_path.to_string(), line)) {
            return Err(SieveError::Repository("HTTP 422".into()));
        }
        Ok(self.push(
            body,
            Some(LineTarget {
                file_path: file_path.to_string(),
                line,
            }),
        ))
    }

    async fn update_comment(&self, id: u64, body: &str) -> Result<()> {
        let mut comments = self.comments.lock().unwrap();
        let c = comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| SieveError::Repository("HTTP 404".into()))?;
        c.body = body.to_string();
        Ok(())
    }

    async fn get_pull_request(&self) -> Result<PullRequest> {
        Ok(PullRequest {
            number: 1,
            body: self.description.lock().unwrap().clone(),
            head_sha: "head".into(),
            base_ref: "main".into(),
        })
    }

    async fn update_pull_request(&self, body: &str) -> Result<()> {
        *self.description.lock().unwrap() = body.to_string();
        Ok(())
    }
}

struct ScriptedModel(&'static str);

#[async_trait]
impl ReviewModel for ScriptedModel {
    async fn complete(&self, _messages: Vec<ChatMessage>) -> Result<Completion> {
        Ok(Completion::new(self.0))
    }
}

const PATCH: &str = "\
diff --git a/auth.py b/auth.py
--- a/auth.py
+++ b/auth.py
@@ -1 +1,3 @@
 import sqlite3
+def login(conn, user):
+    return conn.execute(\"SELECT * FROM users WHERE name = '\" + user + \"'\")
";

const AUTH: &str = "import sqlite3\ndef login(conn, user):\n    return conn.execute(\"SELECT * FROM users WHERE name = '\" + user + \"'\")\n";

const REPLY: &str = "\
3 : [Security] sql query is built by string concatenation
1 : [Style] unused import
99 : [Logic] function never closes the connection";

fn setup() -> (tempfile::TempDir, Vec<sieve_core::ReviewRequest>) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("auth.py"), AUTH).unwrap();
    let requests = PatchDiffSource::new(dir.path(), PATCH)
        .changed_files()
        .unwrap();
    (dir, requests)
}

#[tokio::test]
async fn patch_to_published_comments() {
    let (_dir, requests) = setup();
    assert_eq!(requests.len(), 1);

    let host = MemoryHost::new(&[("auth.py", 2), ("auth.py", 3)]);
    let model = ScriptedModel(REPLY);
    let mut config = SieveConfig::default();
    config.review.snippet_context_lines = 0;

    let report = ReviewPipeline::new(&config, &model, &host, "head")
        .run(requests.clone())
        .await;
    assert_eq!(report.found(), 3);
    assert_eq!(report.posted(), 3);
    assert_eq!(report.failed(), 0);

    let comments = host.comments.lock().unwrap().clone();
    // line 3 is in the diff; line 1 is context only; 99 is out of range
    assert_eq!(comments[0].target.as_ref().map(|t| t.line), Some(3));
    assert!(comments[0]
        .body
        .starts_with("[Security] Sql query is built by string concatenation.\n\n```\n"));
    assert_eq!(comments[1].target, None);
    assert_eq!(comments[1].body, "`auth.py`\nLine 1: [Style] Unused import.");
    assert_eq!(
        comments[2].body,
        "`auth.py`\n[Logic] Function never closes the connection."
    );

    let description = host.description.lock().unwrap().clone();
    assert!(description.starts_with("Fixes the login bug.\n\n<!-- sieve:summary -->\n"));
    assert!(description.contains("| `auth.py` | issues found | 3 |"));

    // same change set again: nothing new anywhere
    let again = ReviewPipeline::new(&config, &model, &host, "head")
        .run(requests)
        .await;
    assert_eq!(again.posted(), 0);
    assert_eq!(host.comments.lock().unwrap().len(), 3);
    assert_eq!(*host.description.lock().unwrap(), description);
}

#[tokio::test]
async fn summary_comment_is_updated_in_place() {
    let (_dir, requests) = setup();
    let host = MemoryHost::new(&[]);
    let mut config = SieveConfig::default();
    config.summary.target = SummaryTarget::Comment;
    config.summary.heading = "Bot".into();

    let first = ScriptedModel("No critical issues found");
    ReviewPipeline::new(&config, &first, &host, "head")
        .run(requests.clone())
        .await;
    {
        let comments = host.comments.lock().unwrap();
        assert_eq!(comments.len(), 2);
        assert!(comments[1].body.contains("| `auth.py` | no issues | 0 |"));
    }

    let second = ScriptedModel("2 : [Logic] user is not validated");
    ReviewPipeline::new(&config, &second, &host, "head")
        .run(requests)
        .await;
    let comments = host.comments.lock().unwrap();
    assert_eq!(comments.len(), 3);
    let summaries: Vec<_> = comments
        .iter()
        .filter(|c| c.body.contains("<!-- sieve:summary -->"))
        .collect();
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].body.contains("| `auth.py` | issues found | 1 |"));
    assert_eq!(*host.description.lock().unwrap(), "Fixes the login bug.\n");
}
