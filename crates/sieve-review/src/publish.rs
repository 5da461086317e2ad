//! Post a batch of comments, one at a time, with a single fallback.

use sieve_core::{CommentBatch, PublishOutcome, PublishTarget};

use crate::host::ReviewHost;
use crate::render::CommentRenderer;

/// Publish every comment in `batch` to `host`.
///
/// Anchored comments (`line > 0`) are first posted on their line. If that
/// fails, or the comment is unanchored, exactly one conversation comment is
/// posted instead. A comment whose attempts all fail is logged and counted
/// in [`PublishOutcome::failed`]; the rest of the batch still goes out.
///
/// Never returns an error.
pub async fn publish(
    batch: &CommentBatch,
    target: &PublishTarget,
    host: &dyn ReviewHost,
    renderer: &CommentRenderer<'_>,
) -> PublishOutcome {
    let mut outcome = PublishOutcome::default();

    for comment in batch {
        if comment.is_anchored() {
            let body = renderer.line_body(comment);
            match host
                .post_comment_to_line(&body, &target.commit_id, &target.file_path, comment.line)
                .await
            {
                Ok(id) => {
                    tracing::debug!(id, file = %target.file_path, line = comment.line, "posted line comment");
                    outcome.posted += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        file = %target.file_path,
                        line = comment.line,
                        error = %e,
                        "line comment rejected, falling back to a general comment"
                    );
                }
            }
        }

        match host.post_comment_general(&renderer.general_body(comment)).await {
            Ok(id) => {
                tracing::debug!(id, file = %target.file_path, "posted general comment");
                outcome.posted += 1;
            }
            Err(e) => {
                tracing::warn!(
                    file = %target.file_path,
                    line = comment.line,
                    error = %e,
                    "failed to post comment"
                );
                outcome.failed += 1;
            }
        }
    }

    outcome
}
