//! Drop comments that are already on the pull request.
//!
//! A candidate is a duplicate when any remote comment has exactly the text
//! the candidate would be published with, in either its line-anchored or
//! its general form. The host may return bodies with CRLF line endings or
//! trailing whitespace, so both sides are compared after normalizing those.
//!
//! This only protects against reruns. Two runs racing on the same pull
//! request can still both post.

use std::collections::HashSet;

use sieve_core::{CommentBatch, PostedCommentRecord};

use crate::render::CommentRenderer;

/// Remove candidates already present in `existing`, and later repeats
/// within `batch` itself. Order is preserved.
///
/// # Examples
///
/// ```
/// use sieve_core::{LineComment, PostedCommentRecord};
/// use sieve_review::dedup::filter;
/// use sieve_review::render::CommentRenderer;
///
/// let renderer = CommentRenderer::new("a.py", "x = 1\n", 0);
/// let batch = vec![
///     LineComment::unanchored("Old news."),
///     LineComment::unanchored("Fresh."),
/// ];
/// let existing = vec![PostedCommentRecord {
///     id: 1,
///     body: "`a.py`\nOld news.".into(),
///     author: None,
///     target: None,
/// }];
/// let kept = filter(batch, &existing, &renderer);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].body, "Fresh.");
/// ```
pub fn filter(
    batch: CommentBatch,
    existing: &[PostedCommentRecord],
    renderer: &CommentRenderer<'_>,
) -> CommentBatch {
    let mut seen: HashSet<String> = existing.iter().map(|c| canonical(&c.body)).collect();
    let before = batch.len();

    let kept: CommentBatch = batch
        .into_iter()
        .filter(|comment| {
            let forms: Vec<String> = renderer
                .renderings(comment)
                .iter()
                .map(|f| canonical(f))
                .collect();
            if forms.iter().any(|f| seen.contains(f)) {
                tracing::debug!(
                    file = renderer.file_path(),
                    line = comment.line,
                    "skipping comment already on the pull request"
                );
                return false;
            }
            seen.extend(forms);
            true
        })
        .collect();

    if kept.len() < before {
        tracing::info!(
            file = renderer.file_path(),
            dropped = before - kept.len(),
            "deduplicated comments"
        );
    }
    kept
}

fn canonical(body: &str) -> String {
    body.replace("\r\n", "\n").trim_end().to_string()
}
