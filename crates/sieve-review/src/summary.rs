//! The single managed summary block on a pull request.
//!
//! The block starts at the marker token and ends at its closing comment,
//! `<!-- /token -->` (see [`end_marker`]). Blocks written without the closing
//! comment end at the next heading no deeper than the block's own opening
//! heading, or at the end of the document. Everything outside that span
//! belongs to humans and is preserved byte for byte.

use sieve_core::{Result, SummaryConfig, SummaryTarget};

use crate::host::ReviewHost;

/// Insert or replace the managed block in `existing_document`.
///
/// When the marker is missing the block is appended after a blank line.
/// Top-level headings in `generated_body` are demoted one level and copies
/// of either marker are removed, so applying the result again is a no-op.
///
/// # Examples
///
/// ```
/// use sieve_review::summary::upsert;
///
/// let doc = "<!--SUM-->\nold text\n# Notes\nMore human notes";
/// let out = upsert("<!--SUM-->", "new text", doc);
/// assert_eq!(out, "<!--SUM-->\nnew text\n<!-- /SUM -->\n# Notes\nMore human notes");
/// assert_eq!(upsert("<!--SUM-->", "new text", &out), out);
/// ```
pub fn upsert(marker: &str, generated_body: &str, existing_document: &str) -> String {
    let closing = end_marker(marker);
    let block = format!(
        "{marker}\n{}\n{closing}\n",
        sanitize_body(marker, &closing, generated_body)
    );

    let Some(start) = find_marker(existing_document, marker) else {
        return match existing_document {
            "" => block,
            doc if doc.ends_with('\n') => format!("{doc}\n{block}"),
            doc => format!("{doc}\n\n{block}"),
        };
    };

    let after_marker = start + marker.len();
    let end = match existing_document[after_marker..].find(&closing) {
        Some(i) => {
            let end = after_marker + i + closing.len();
            let tail = &existing_document[end..];
            end + if tail.starts_with("\r\n") {
                2
            } else if tail.starts_with('\n') {
                1
            } else {
                0
            }
        }
        None => after_marker + open_span_len(&existing_document[after_marker..]),
    };

    let mut out = String::with_capacity(existing_document.len() + block.len());
    out.push_str(&existing_document[..start]);
    out.push_str(&block);
    out.push_str(&existing_document[end..]);
    out
}

/// Closing comment paired with `marker`.
///
/// ```
/// use sieve_review::summary::end_marker;
///
/// assert_eq!(end_marker("<!-- sieve:summary -->"), "<!-- /sieve:summary -->");
/// assert_eq!(end_marker("SUMMARY"), "<!-- /SUMMARY -->");
/// ```
pub fn end_marker(marker: &str) -> String {
    let inner = marker
        .strip_prefix("<!--")
        .and_then(|m| m.strip_suffix("-->"))
        .unwrap_or(marker)
        .trim();
    format!("<!-- /{inner} -->")
}

/// First occurrence of `marker` that is not part of its own closing comment.
fn find_marker(doc: &str, marker: &str) -> Option<usize> {
    doc.match_indices(marker)
        .map(|(i, _)| i)
        .find(|&i| !doc[..i].ends_with("<!-- /"))
}

/// Length of an unclosed block that starts right after its marker.
fn open_span_len(rest: &str) -> usize {
    let mut offset = 0;
    let mut limit = None;
    for (n, line) in rest.split_inclusive('\n').enumerate() {
        let level = heading_level(line.trim_end());
        // the remainder of the marker line is always part of the block
        if n > 0 {
            match (limit, level) {
                (None, Some(level)) => limit = Some(level),
                (None, None) if !line.trim().is_empty() => limit = Some(1),
                (Some(limit), Some(level)) if level <= limit => return offset,
                _ => {}
            }
        }
        offset += line.len();
    }
    rest.len()
}

fn heading_level(line: &str) -> Option<usize> {
    let level = line.chars().take_while(|&c| c == '#').count();
    let rest = &line[level..];
    ((1..=6).contains(&level) && (rest.is_empty() || rest.starts_with(' '))).then_some(level)
}

fn sanitize_body(marker: &str, closing: &str, body: &str) -> String {
    body.replace(closing, "")
        .replace(marker, "")
        .lines()
        .map(|line| {
            if line.starts_with("# ") {
                format!("#{line}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

/// Write `generated_body` to wherever `config.target` says the summary lives.
///
/// The document is only written when the upsert changes it.
///
/// # Errors
///
/// Returns the host's [`SieveError::Repository`](sieve_core::SieveError::Repository)
/// if reading or writing fails.
pub async fn publish_summary(
    host: &dyn ReviewHost,
    config: &SummaryConfig,
    generated_body: &str,
) -> Result<()> {
    let marker = config.marker.as_str();
    match config.target {
        SummaryTarget::Description => {
            let pr = host.get_pull_request().await?;
            let updated = upsert(marker, generated_body, &pr.body);
            if updated == pr.body {
                tracing::debug!("summary unchanged");
                return Ok(());
            }
            host.update_pull_request(&updated).await?;
            tracing::info!(pr = pr.number, "updated summary in pull request description");
        }
        SummaryTarget::Comment => {
            let comments = host.get_comments().await?;
            let existing = comments
                .iter()
                .find(|c| c.target.is_none() && c.body.contains(marker));
            match existing {
                Some(comment) => {
                    let updated = upsert(marker, generated_body, &comment.body);
                    if updated == comment.body {
                        tracing::debug!("summary unchanged");
                        return Ok(());
                    }
                    host.update_comment(comment.id, &updated).await?;
                    tracing::info!(id = comment.id, "updated summary comment");
                }
                None => {
                    let id = host
                        .post_comment_general(&upsert(marker, generated_body, ""))
                        .await?;
                    tracing::info!(id, "posted summary comment");
                }
            }
        }
    }
    Ok(())
}
