//! Exact text of the comments sieve posts.
//!
//! Both the publisher and the deduplicator go through [`CommentRenderer`],
//! so a comment posted on an earlier run compares equal to its candidate on
//! the next one.

use sieve_core::LineComment;

/// Renders the two published forms of a [`LineComment`].
///
/// # Examples
///
/// ```
/// use sieve_core::LineComment;
/// use sieve_review::render::CommentRenderer;
///
/// let renderer = CommentRenderer::new("app.py", "a = 1\nb = 2\nc = 3\n", 1);
/// let comment = LineComment { line: 2, category: None, severity: None, body: "Check b.".into() };
///
/// assert_eq!(renderer.line_body(&comment), "Check b.\n\n```\na = 1\nb = 2\nc = 3\n```");
/// assert_eq!(renderer.general_body(&comment), "`app.py`\nLine 2: Check b.");
/// ```
#[derive(Debug, Clone)]
pub struct CommentRenderer<'a> {
    file_path: &'a str,
    lines: Vec<&'a str>,
    context_lines: usize,
}

impl<'a> CommentRenderer<'a> {
    pub fn new(file_path: &'a str, file_text: &'a str, context_lines: usize) -> Self {
        Self {
            file_path,
            lines: file_text.lines().collect(),
            context_lines,
        }
    }

    pub fn file_path(&self) -> &str {
        self.file_path
    }

    /// Body for a line-anchored review comment: the finding followed by the
    /// surrounding code, fenced.
    pub fn line_body(&self, comment: &LineComment) -> String {
        match self.snippet(comment.line) {
            Some(code) => format!("{}\n\n```\n{code}\n```", comment.body),
            None => comment.body.clone(),
        }
    }

    /// Body for a conversation comment: the file path on its own line,
    /// then the finding, with its line number when it had one.
    pub fn general_body(&self, comment: &LineComment) -> String {
        if comment.is_anchored() {
            format!("`{}`\nLine {}: {}", self.file_path, comment.line, comment.body)
        } else {
            format!("`{}`\n{}", self.file_path, comment.body)
        }
    }

    /// Every form this comment could have been published in.
    pub fn renderings(&self, comment: &LineComment) -> Vec<String> {
        let mut out = vec![self.general_body(comment)];
        if comment.is_anchored() {
            out.push(self.line_body(comment));
        }
        out
    }

    fn snippet(&self, line: u32) -> Option<String> {
        let line = usize::try_from(line).ok()?;
        if line == 0 || line > self.lines.len() {
            return None;
        }
        let start = line.saturating_sub(1 + self.context_lines);
        let end = (line + self.context_lines).min(self.lines.len());
        Some(self.lines[start..end].join("\n"))
    }
}
