//! Turn a free-form model reply into a [`CommentBatch`].
//!
//! The reply is first cut into logical blocks, then each block is offered to
//! the [`Dialect`]s in [`Dialect::PRIORITY`] order. The first dialect that
//! accepts a block produces its comment; [`Dialect::UnstructuredFallback`]
//! accepts anything, so no model text is ever silently lost.
//!
//! Parsing never fails. Malformed input degrades to unanchored comments.

use std::sync::LazyLock;

use regex::Regex;
use sieve_core::{CommentBatch, LineComment};

use crate::sentinel::{is_only_phrase, is_phrase, NO_ISSUES_PHRASE};

/// `12 : [Category] description`; the category is optional.
static PLAIN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:line)?\s*(\d+)(?:\s*-\s*\d+)?\s*:\s*(?:\[([^\[\]\n]+)\]\s*)?(\S.*)$")
        .expect("invalid plain line regex")
});

/// `12 : [Severity] [Category] description`.
static SEVERITY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?i:line)?\s*(\d+)(?:\s*-\s*\d+)?\s*:\s*\[([^\[\]\n]+)\]\s*\[([^\[\]\n]+)\]\s*(\S.*)$",
    )
    .expect("invalid severity line regex")
});

/// `### [Line 12] - [Severity] - [Category] - description`.
/// Bold markers are tolerated around the line tag and the labels only.
static HEADING_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^#{1,6}\s*(?:\*\*)?\[?(?i:line)\s*(\d+)(?:\s*-\s*\d+)?\]?(?:\*\*)?",
        r"\s*[-:–—]\s*(?:\*\*)?\s*\[([^\[\]\n]+)\](?:\*\*)?",
        r"\s*[-–—]\s*(?:\*\*)?\[([^\[\]\n]+)\](?:\*\*)?",
        r"\s*[-:–—]\s*(\S.*)$",
    ))
    .expect("invalid heading block regex")
});

/// Start of any single-line entry, used to split consecutive entries.
static LINE_ENTRY_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:line)?\s*\d+(?:\s*-\s*\d+)?\s*:").expect("invalid entry start regex")
});

/// Entry header with bold markers around its colon, as in `Line 4:**`.
static BOLD_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?i:line)?\s*\d+(?:\s*-\s*\d+)?)\s*(?:\*\*)?\s*:(?:\s*\*\*(\s|$))?")
        .expect("invalid bold header regex")
});

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:-{3,}|\*{3,}|_{3,})$").expect("invalid separator regex"));

/// A reply format the parser understands.
///
/// Each variant is a self-contained matcher; see [`Dialect::match_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `12 : [Category] description`
    PlainLine,
    /// `12 : [Severity] [Category] description`
    SeverityLine,
    /// `### [Line 12] - [Severity] - [Category] - description` with an
    /// optional body (code excerpts, "Suggested Fix") kept verbatim.
    HeadingBlock,
    /// Anything else, published as an unanchored comment.
    UnstructuredFallback,
}

impl Dialect {
    /// Order in which dialects are tried on every block.
    pub const PRIORITY: [Dialect; 4] = [
        Dialect::PlainLine,
        Dialect::SeverityLine,
        Dialect::HeadingBlock,
        Dialect::UnstructuredFallback,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dialect::PlainLine => "plain-line",
            Dialect::SeverityLine => "severity-line",
            Dialect::HeadingBlock => "heading-block",
            Dialect::UnstructuredFallback => "unstructured",
        }
    }

    /// Try to read `block` as this dialect.
    ///
    /// Lines outside `1..=max_line_number` are kept but reported as line 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use sieve_review::parser::Dialect;
    ///
    /// let c = Dialect::PlainLine
    ///     .match_block("42 : [Security] sql query uses raw input", 100)
    ///     .unwrap();
    /// assert_eq!(c.line, 42);
    /// assert_eq!(c.body, "[Security] Sql query uses raw input.");
    ///
    /// assert!(Dialect::SeverityLine.match_block("just prose", 100).is_none());
    /// ```
    pub fn match_block(self, block: &str, max_line_number: u32) -> Option<LineComment> {
        let block = block.trim();
        if block.is_empty() {
            return None;
        }
        match self {
            Dialect::PlainLine => match_plain_line(block, max_line_number),
            Dialect::SeverityLine => match_severity_line(block, max_line_number),
            Dialect::HeadingBlock => match_heading_block(block, max_line_number),
            Dialect::UnstructuredFallback => Some(LineComment::unanchored(normalize(block))),
        }
    }
}

/// Parse a model reply into comments, in order of appearance.
///
/// Empty, absent, or "No critical issues found" replies yield an empty
/// batch.
///
/// # Examples
///
/// ```
/// use sieve_review::parser::parse;
///
/// let raw = "3 : [Logic] loop never terminates\n7 : [High] [Security] token is logged";
/// let batch = parse(Some(raw), 10);
/// assert_eq!(batch.len(), 2);
/// assert_eq!(batch[1].line, 7);
/// assert_eq!(batch[1].body, "[High] [Security] Token is logged.");
///
/// assert!(parse(Some("No critical issues found"), 10).is_empty());
/// assert!(parse(None, 10).is_empty());
/// ```
pub fn parse(raw: Option<&str>, max_line_number: u32) -> CommentBatch {
    parse_with_phrase(raw, max_line_number, NO_ISSUES_PHRASE)
}

/// [`parse`] for a prompt that asked for a different no-issues phrase.
///
/// ```
/// use sieve_review::parser::parse_with_phrase;
///
/// assert!(parse_with_phrase(Some("LGTM"), 10, "LGTM").is_empty());
/// assert_eq!(parse_with_phrase(Some("3 : [Logic] x\n\nLGTM"), 10, "LGTM").len(), 1);
/// ```
pub fn parse_with_phrase(raw: Option<&str>, max_line_number: u32, phrase: &str) -> CommentBatch {
    let Some(raw) = raw else {
        return Vec::new();
    };
    if raw.trim().is_empty() || is_phrase(Some(raw), phrase) {
        return Vec::new();
    }

    let mut batch = Vec::new();
    for block in segment(raw) {
        if is_only_phrase(&block, phrase) {
            continue;
        }
        let matched = Dialect::PRIORITY
            .iter()
            .find_map(|d| d.match_block(&block, max_line_number).map(|c| (*d, c)));
        if let Some((dialect, comment)) = matched {
            tracing::debug!(dialect = dialect.name(), line = comment.line, "parsed block");
            batch.push(comment);
        }
    }
    batch
}

enum OpenBlock {
    Paragraph,
    Heading(usize),
}

/// Split a reply into logical blocks.
///
/// Fenced code is never split. Separator lines end the current block and
/// are dropped. A heading opens a block that swallows blank lines and
/// deeper sub-headings; a paragraph ends at a blank line. In both, a line
/// that starts a single-line entry opens a new block.
///
/// # Examples
///
/// ```
/// use sieve_review::parser::segment;
///
/// let blocks = segment("1: a\n2: b\n\nprose\n---\nmore");
/// assert_eq!(blocks, vec!["1: a", "2: b", "prose", "more"]);
/// ```
pub fn segment(raw: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    let mut open: Option<OpenBlock> = None;
    let mut fence: Option<&str> = None;

    let mut flush = |lines: &mut Vec<&str>, open: &mut Option<OpenBlock>| {
        let text = lines.join("\n");
        let text = text.trim_matches('\n').trim_end();
        if !text.trim().is_empty() {
            blocks.push(text.to_string());
        }
        lines.clear();
        *open = None;
    };

    for line in raw.lines() {
        let trimmed = line.trim();

        if let Some(marker) = fence {
            lines.push(line);
            if trimmed.starts_with(marker) {
                fence = None;
            }
            continue;
        }

        if let Some(marker) = fence_marker(trimmed) {
            if open.is_none() {
                open = Some(OpenBlock::Paragraph);
            }
            lines.push(line);
            fence = Some(marker);
            continue;
        }

        if SEPARATOR.is_match(trimmed) {
            flush(&mut lines, &mut open);
            continue;
        }

        if let Some(level) = heading_level(trimmed) {
            if let Some(OpenBlock::Heading(current)) = open {
                if level > current {
                    lines.push(line);
                    continue;
                }
            }
            flush(&mut lines, &mut open);
            lines.push(line);
            open = Some(OpenBlock::Heading(level));
            continue;
        }

        if trimmed.is_empty() {
            match open {
                Some(OpenBlock::Heading(_)) => lines.push(line),
                _ => flush(&mut lines, &mut open),
            }
            continue;
        }

        if starts_line_entry(trimmed) && open.is_some() {
            flush(&mut lines, &mut open);
        }
        if open.is_none() {
            open = Some(OpenBlock::Paragraph);
        }
        lines.push(line);
    }
    flush(&mut lines, &mut open);
    blocks
}

fn fence_marker(trimmed: &str) -> Option<&'static str> {
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

fn heading_level(trimmed: &str) -> Option<usize> {
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    match trimmed[level..].chars().next() {
        None => Some(level),
        Some(c) if c.is_whitespace() || c == '[' => Some(level),
        _ => None,
    }
}

fn starts_line_entry(trimmed: &str) -> bool {
    LINE_ENTRY_START.is_match(&strip_decorations(trimmed))
}

/// Remove list bullets, blockquote markers, emoji and bold markers that
/// models like to put in front of an entry.
///
/// Bold is only removed ahead of the text and around the header colon; the
/// description itself is never touched.
fn strip_decorations(line: &str) -> String {
    let mut rest = line.trim();
    loop {
        let before = rest;
        rest = rest.trim_start();
        for prefix in ["**", "- ", "* ", "• ", "> ", ">"] {
            if let Some(r) = rest.strip_prefix(prefix) {
                rest = r;
            }
        }
        rest = rest.trim_start_matches(|c: char| !c.is_ascii() && !c.is_alphanumeric());
        if rest == before {
            break;
        }
    }
    BOLD_HEADER.replace(rest, "$1 :$2").into_owned()
}

/// First line of a block with decorations removed, plus the rest verbatim.
fn split_entry(block: &str) -> (String, &str) {
    let (first, rest) = block.split_once('\n').unwrap_or((block, ""));
    (strip_decorations(first), rest)
}

fn match_plain_line(block: &str, max: u32) -> Option<LineComment> {
    let (first, rest) = split_entry(block);
    let caps = PLAIN_LINE.captures(&first)?;
    let desc = caps.get(3)?.as_str();
    if desc.starts_with('[') {
        return None;
    }
    let category = caps.get(2).map(|m| m.as_str().trim().to_string());
    Some(line_comment(
        anchor(&caps[1], max),
        None,
        category,
        desc,
        rest,
    ))
}

fn match_severity_line(block: &str, max: u32) -> Option<LineComment> {
    let (first, rest) = split_entry(block);
    let caps = SEVERITY_LINE.captures(&first)?;
    Some(line_comment(
        anchor(&caps[1], max),
        Some(caps[2].trim().to_string()),
        Some(caps[3].trim().to_string()),
        &caps[4],
        rest,
    ))
}

fn match_heading_block(block: &str, max: u32) -> Option<LineComment> {
    let (first, rest) = block.split_once('\n').unwrap_or((block, ""));
    let caps = HEADING_BLOCK.captures(first.trim())?;
    let severity = caps[2].trim().to_string();
    let category = caps[3].trim().to_string();
    let mut body = format!(
        "{}{}",
        prefixes(Some(&severity), Some(&category)),
        normalize(&caps[4])
    );
    let rest = rest.trim_matches('\n').trim_end();
    if !rest.trim().is_empty() {
        body.push_str("\n\n");
        body.push_str(rest);
    }
    Some(LineComment {
        line: anchor(&caps[1], max),
        category: Some(category),
        severity: Some(severity),
        body,
    })
}

fn line_comment(
    line: u32,
    severity: Option<String>,
    category: Option<String>,
    desc: &str,
    rest: &str,
) -> LineComment {
    let rest = rest.trim_end();
    let has_fence = rest.lines().any(|l| fence_marker(l.trim()).is_some());
    let body = if rest.trim().is_empty() {
        normalize(desc)
    } else if has_fence {
        format!("{}\n{}", normalize(desc), rest)
    } else {
        let joined: Vec<&str> = std::iter::once(desc.trim())
            .chain(rest.lines().map(str::trim).filter(|l| !l.is_empty()))
            .collect();
        normalize(&joined.join(" "))
    };
    LineComment {
        body: format!(
            "{}{}",
            prefixes(severity.as_deref(), category.as_deref()),
            body
        ),
        line,
        category,
        severity,
    }
}

fn prefixes(severity: Option<&str>, category: Option<&str>) -> String {
    let mut out = String::new();
    for label in [severity, category].into_iter().flatten() {
        out.push('[');
        out.push_str(label);
        out.push_str("] ");
    }
    out
}

/// Map a captured line number into `1..=max`, or 0.
fn anchor(digits: &str, max: u32) -> u32 {
    match digits.parse::<u32>() {
        Ok(n) if (1..=max).contains(&n) => n,
        _ => 0,
    }
}

/// Trim, capitalize the first letter and make sure the text ends with
/// punctuation. Text ending in a code fence is left open.
fn normalize(text: &str) -> String {
    let text = text.trim();
    let mut chars = text.chars();
    let mut out = match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect::<String>(),
        None => return String::new(),
    };
    let last_line = out.lines().last().unwrap_or("").trim();
    let ends_in_fence = fence_marker(last_line).is_some();
    if !ends_in_fence && !out.ends_with(['.', '!', '?']) {
        out.push('.');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_absent_input() {
        assert!(parse(Some(""), 10).is_empty());
        assert!(parse(Some("  \n\n "), 10).is_empty());
        assert!(parse(None, 10).is_empty());
    }

    #[test]
    fn reference_example() {
        let batch = parse(Some("42 : [Security] sql query uses raw input"), 100);
        assert_eq!(
            batch,
            vec![LineComment {
                line: 42,
                category: Some("Security".into()),
                severity: None,
                body: "[Security] Sql query uses raw input.".into(),
            }]
        );
    }

    #[test]
    fn sentinel_reply_is_empty() {
        assert!(parse(Some("No critical issues found"), 10).is_empty());
        assert!(parse(Some("  no critical issues found.\n"), 10).is_empty());
    }

    #[test]
    fn sentinel_block_among_others_contributes_nothing() {
        let raw = "Here is my review.\n\nNo critical issues found.";
        let batch = parse(Some(raw), 10);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].body, "Here is my review.");
    }

    #[test]
    fn custom_phrase_block_is_dropped() {
        let raw = "2 : [Logic] off by one\n\nLGTM.";
        let batch = parse_with_phrase(Some(raw), 10, "LGTM");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].line, 2);
        // the default phrase is not special under a custom one
        let batch = parse_with_phrase(Some("No critical issues found"), 10, "LGTM");
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn several_entries_keep_order() {
        let raw = "1 : [Logic] first\n5: [Style] second one\n9 :third without category";
        let batch = parse(Some(raw), 10);
        let lines: Vec<u32> = batch.iter().map(|c| c.line).collect();
        assert_eq!(lines, vec![1, 5, 9]);
        assert_eq!(batch[1].body, "[Style] Second one.");
        assert_eq!(batch[2].body, "Third without category.");
        assert!(batch[2].category.is_none());
    }

    #[test]
    fn out_of_range_lines_become_unanchored() {
        let raw = "0 : [Logic] zero\n11 : [Logic] past the end\n99999999999999 : [Logic] overflow";
        let batch = parse(Some(raw), 10);
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|c| c.line == 0));
        assert_eq!(batch[1].body, "[Logic] Past the end.");
    }

    #[test]
    fn empty_file_bound_unanchors_everything() {
        let batch = parse(Some("1 : [Logic] x"), 0);
        assert_eq!(batch[0].line, 0);
    }

    #[test]
    fn severity_line_dialect() {
        let c = Dialect::SeverityLine
            .match_block("7 : [High] [Security] token is logged", 10)
            .unwrap();
        assert_eq!(c.line, 7);
        assert_eq!(c.severity.as_deref(), Some("High"));
        assert_eq!(c.category.as_deref(), Some("Security"));
        assert_eq!(c.body, "[High] [Security] Token is logged.");
        assert!(Dialect::PlainLine
            .match_block("7 : [High] [Security] token is logged", 10)
            .is_none());
    }

    #[test]
    fn decorations_are_tolerated() {
        for raw in [
            "- 4 : [Bug] null deref",
            "* Line 4: [Bug] null deref",
            "• 4 : [Bug] null deref",
            "> 4 : [Bug] null deref",
            "🔴 4 : [Bug] null deref",
            "⚠️ **Line 4:** [Bug] null deref",
        ] {
            let batch = parse(Some(raw), 10);
            assert_eq!(batch.len(), 1, "{raw:?}");
            assert_eq!(batch[0].line, 4, "{raw:?}");
            assert_eq!(batch[0].body, "[Bug] Null deref.", "{raw:?}");
        }
    }

    #[test]
    fn bold_inside_description_is_kept() {
        let batch = parse(Some("3 : [Logic] use 2**10 instead of the literal"), 10);
        assert_eq!(batch[0].body, "[Logic] Use 2**10 instead of the literal.");

        let batch = parse(Some("5 : [High] [Perf] avoid copying **kwargs"), 10);
        assert_eq!(batch[0].severity.as_deref(), Some("High"));
        assert_eq!(batch[0].body, "[High] [Perf] Avoid copying **kwargs.");

        let batch = parse(Some("7 : **kwargs are copied on every call"), 10);
        assert_eq!(batch[0].line, 7);
        assert_eq!(batch[0].body, "**kwargs are copied on every call.");

        let batch = parse(Some("**Line 4:** [Bug] glob **/*.rs matches vendored code"), 10);
        assert_eq!(batch[0].line, 4);
        assert_eq!(batch[0].body, "[Bug] Glob **/*.rs matches vendored code.");
    }

    #[test]
    fn bold_inside_heading_description_is_kept() {
        let batch = parse(Some("### [Line 4] - [High] - [Bug] - a**b overflows"), 10);
        assert_eq!(batch[0].line, 4);
        assert_eq!(batch[0].body, "[High] [Bug] A**b overflows.");

        let batch = parse(Some("### **[Line 6]** - **[Low]** - **[Style]** - x**2 reads oddly"), 10);
        assert_eq!(batch[0].line, 6);
        assert_eq!(batch[0].severity.as_deref(), Some("Low"));
        assert_eq!(batch[0].body, "[Low] [Style] X**2 reads oddly.");
    }

    #[test]
    fn line_range_anchors_to_first_line() {
        let batch = parse(Some("Line 3-6: [Logic] loop bounds are inverted"), 10);
        assert_eq!(batch[0].line, 3);
    }

    #[test]
    fn wrapped_description_is_joined() {
        let raw = "3 : [Logic] the loop runs\none time too many";
        let batch = parse(Some(raw), 10);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].body, "[Logic] The loop runs one time too many.");
    }

    #[test]
    fn existing_punctuation_is_kept() {
        let batch = parse(Some("2 : [Logic] is this reachable?"), 10);
        assert_eq!(batch[0].body, "[Logic] Is this reachable?");
    }

    #[test]
    fn entry_with_fenced_suggestion_keeps_fence_intact() {
        let raw = "3 : [Security] use a parameterized query\n```python\nconn.execute(q, (name,))\n```";
        let batch = parse(Some(raw), 10);
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch[0].body,
            "[Security] Use a parameterized query.\n```python\nconn.execute(q, (name,))\n```"
        );
    }

    #[test]
    fn heading_block_dialect_keeps_body_verbatim() {
        let raw = "\
### [Line 12] - [High] - [Security] - user input reaches the shell

```diff
- os.system(cmd)
+ subprocess.run(args, check=True)
```

#### Suggested Fix
Pass arguments as a list.";
        let batch = parse(Some(raw), 20);
        assert_eq!(batch.len(), 1);
        let c = &batch[0];
        assert_eq!(c.line, 12);
        assert_eq!(c.severity.as_deref(), Some("High"));
        assert_eq!(c.category.as_deref(), Some("Security"));
        assert!(c.body.starts_with("[High] [Security] User input reaches the shell.\n\n```diff"));
        assert!(c.body.contains("#### Suggested Fix\nPass arguments as a list."));
        assert!(c.body.contains("```\n\n####"));
    }

    #[test]
    fn consecutive_heading_blocks_split() {
        let raw = "\
### Line 2 - [Low] - [Style] - rename this

### Line 5 - [High] - [Logic] - wrong operator
---
### [Line 8] - [Medium] - [Perf] - quadratic loop";
        let batch = parse(Some(raw), 10);
        let lines: Vec<u32> = batch.iter().map(|c| c.line).collect();
        assert_eq!(lines, vec![2, 5, 8]);
        assert_eq!(batch[1].body, "[High] [Logic] Wrong operator.");
    }

    #[test]
    fn fence_with_blank_lines_and_separators_is_not_split() {
        let raw = "Consider this rewrite:\n```\nfirst\n\n---\n\nsecond\n```";
        let blocks = segment(raw);
        assert_eq!(blocks.len(), 1);
        let batch = parse(Some(raw), 10);
        assert_eq!(batch[0].line, 0);
        assert!(batch[0].body.ends_with("second\n```"));
    }

    #[test]
    fn unstructured_text_falls_back() {
        let raw = "overall the change looks reasonable\n\nthough tests are missing";
        let batch = parse(Some(raw), 10);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].body, "Overall the change looks reasonable.");
        assert_eq!(batch[0].line, 0);
        assert!(batch[0].category.is_none());
    }

    #[test]
    fn entry_without_description_falls_back() {
        let batch = parse(Some("12 : [Security]"), 20);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].line, 0);
        assert!(batch[0].body.contains("12 : [Security]"));
    }

    #[test]
    fn heading_followed_by_entries() {
        let raw = "## Findings\n3 : [Logic] a\n4 : [Logic] b";
        let batch = parse(Some(raw), 10);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].line, 0);
        assert_eq!(batch[1].line, 3);
        assert_eq!(batch[2].line, 4);
    }

    #[test]
    fn synthetic_reply_round_trips() {
        let entries = [
            (3u32, "Security", "unsanitized input"),
            (8, "Logic", "wrong comparison"),
            (15, "Performance", "repeated allocation"),
        ];
        let raw: String = entries
            .iter()
            .map(|(l, cat, d)| format!("{l} : [{cat}] {d}\n"))
            .collect();
        let batch = parse(Some(&raw), 20);
        assert_eq!(batch.len(), entries.len());
        for (c, (l, cat, d)) in batch.iter().zip(entries) {
            assert_eq!(c.line, l);
            assert_eq!(c.category.as_deref(), Some(cat));
            let mut expected = d.to_string();
            expected[..1].make_ascii_uppercase();
            assert_eq!(c.body, format!("[{cat}] {expected}."));
        }
    }

    #[test]
    fn hostile_input_does_not_panic() {
        for raw in [
            "```",
            "```\nunterminated",
            "#",
            "###### ",
            "####### seven",
            ":",
            "[",
            "0:",
            "🔥🔥🔥",
            "\u{0}\u{1}",
            "line",
            "- \n* \n> ",
        ] {
            let _ = parse(Some(raw), 10);
        }
    }

    #[test]
    fn segment_drops_separators() {
        assert_eq!(segment("a\n***\nb\n___\nc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn sub_headings_stay_in_heading_block() {
        let blocks = segment("## Issue\ntext\n### Detail\nmore\n## Next");
        assert_eq!(blocks, vec!["## Issue\ntext\n### Detail\nmore", "## Next"]);
    }
}
