use std::fmt;

use serde::Serialize;
use sieve_core::SieveError;

/// One `@@ -a,b +c,d @@` section of a file diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    /// New-side line numbers of the `+` lines in this hunk.
    pub added: Vec<u32>,
}

/// Everything a unified diff says about a single file.
///
/// # Examples
///
/// ```
/// use sieve_difflens::parser::parse_unified_diff;
///
/// let diff = "diff --git a/hello.rs b/hello.rs\n\
///             --- a/hello.rs\n\
///             +++ b/hello.rs\n\
///             @@ -1,2 +1,3 @@\n\
///              fn main() {\n\
///             +    println!(\"hello\");\n\
///              }\n";
/// let files = parse_unified_diff(diff).unwrap();
/// assert_eq!(files[0].path(), "hello.rs");
/// assert_eq!(files[0].added_lines(), vec![2]);
/// assert!(files[0].text.starts_with("diff --git"));
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileDiff {
    pub old_path: String,
    pub new_path: String,
    pub hunks: Vec<Hunk>,
    pub is_new_file: bool,
    pub is_deleted_file: bool,
    pub is_rename: bool,
    pub is_binary: bool,
    /// The raw diff text for this file, headers included.
    pub text: String,
}

impl FileDiff {
    /// Path the file is known by after the change.
    pub fn path(&self) -> &str {
        if self.is_deleted_file || self.new_path.is_empty() {
            &self.old_path
        } else {
            &self.new_path
        }
    }

    /// All added line numbers, in file order.
    pub fn added_lines(&self) -> Vec<u32> {
        self.hunks.iter().flat_map(|h| h.added.iter().copied()).collect()
    }

    /// Whether there is anything a reviewer could comment on.
    pub fn is_reviewable(&self) -> bool {
        !self.is_binary && !self.is_deleted_file && !self.hunks.is_empty()
    }
}

impl fmt::Display for FileDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} hunks)", self.path(), self.hunks.len())
    }
}

/// Split a unified diff (as produced by `git diff`) into per-file entries.
///
/// Plain patches without a `diff --git` line are accepted: a `--- ` header
/// outside of a hunk starts a new file.
///
/// # Errors
///
/// Returns [`SieveError::Parse`] if a hunk header is malformed.
///
/// # Examples
///
/// ```
/// use sieve_difflens::parser::parse_unified_diff;
///
/// assert!(parse_unified_diff("").unwrap().is_empty());
/// ```
pub fn parse_unified_diff(input: &str) -> Result<Vec<FileDiff>, SieveError> {
    let mut state = ParseState::default();
    for line in input.lines() {
        state.feed(line)?;
    }
    Ok(state.finish())
}

#[derive(Default)]
struct ParseState {
    files: Vec<FileDiff>,
    current: Option<FileDiff>,
    /// Old/new lines still expected in the open hunk.
    remaining: (u32, u32),
    next_new_line: u32,
    /// Whether the open file has already seen its `--- ` header.
    saw_old_header: bool,
}

impl ParseState {
    fn feed(&mut self, line: &str) -> Result<(), SieveError> {
        let in_hunk = self.remaining != (0, 0);

        let starts_plain_patch = !in_hunk
            && line.starts_with("--- ")
            && (self.current.is_none() || self.saw_old_header);
        if line.starts_with("diff --git ") || starts_plain_patch {
            self.start_file();
        }
        let Some(file) = self.current.as_mut() else {
            return Ok(());
        };
        file.text.push_str(line);
        file.text.push('\n');

        if in_hunk {
            match line.as_bytes().first() {
                Some(b'+') => {
                    if let Some(h) = file.hunks.last_mut() {
                        h.added.push(self.next_new_line);
                    }
                    self.next_new_line += 1;
                    self.remaining.1 = self.remaining.1.saturating_sub(1);
                }
                Some(b'-') => self.remaining.0 = self.remaining.0.saturating_sub(1),
                Some(b'\\') => {}
                _ => {
                    self.next_new_line += 1;
                    self.remaining.0 = self.remaining.0.saturating_sub(1);
                    self.remaining.1 = self.remaining.1.saturating_sub(1);
                }
            }
            return Ok(());
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some((a, b)) = rest.split_once(" b/") {
                file.old_path = strip_side(a);
                file.new_path = b.trim_matches('"').to_string();
            }
        } else if line.starts_with("new file mode") {
            file.is_new_file = true;
        } else if line.starts_with("deleted file mode") {
            file.is_deleted_file = true;
        } else if line.starts_with("rename from ") || line.starts_with("rename to ") {
            file.is_rename = true;
        } else if line.starts_with("Binary files ") && line.ends_with(" differ") {
            file.is_binary = true;
        } else if let Some(path) = line.strip_prefix("--- ") {
            self.saw_old_header = true;
            if path == "/dev/null" {
                file.is_new_file = true;
            } else {
                file.old_path = strip_side(path);
            }
        } else if let Some(path) = line.strip_prefix("+++ ") {
            if path == "/dev/null" {
                file.is_deleted_file = true;
            } else {
                file.new_path = strip_side(path);
            }
        } else if line.starts_with("@@ ") {
            let hunk = parse_hunk_header(line)?;
            self.remaining = (hunk.old_lines, hunk.new_lines);
            self.next_new_line = hunk.new_start;
            file.hunks.push(hunk);
        }
        Ok(())
    }

    fn start_file(&mut self) {
        if let Some(done) = self.current.take() {
            self.files.push(done);
        }
        self.current = Some(FileDiff::default());
        self.remaining = (0, 0);
        self.saw_old_header = false;
    }

    fn finish(mut self) -> Vec<FileDiff> {
        if let Some(done) = self.current.take() {
            self.files.push(done);
        }
        self.files
    }
}

fn strip_side(raw: &str) -> String {
    let raw = raw.trim_matches('"');
    // `git diff` may append a tab and timestamp to plain patch headers.
    let raw = raw.split('\t').next().unwrap_or(raw);
    raw.strip_prefix("a/")
        .or_else(|| raw.strip_prefix("b/"))
        .unwrap_or(raw)
        .to_string()
}

fn parse_hunk_header(line: &str) -> Result<Hunk, SieveError> {
    let bad = || SieveError::Parse(format!("invalid hunk header: {line}"));
    let inner = line
        .strip_prefix("@@ ")
        .and_then(|s| s.find(" @@").map(|end| &s[..end]))
        .ok_or_else(bad)?;
    let (old, new) = inner.split_once(' ').ok_or_else(bad)?;
    let (old_start, old_lines) = parse_range(old.strip_prefix('-').ok_or_else(bad)?).ok_or_else(bad)?;
    let (new_start, new_lines) = parse_range(new.strip_prefix('+').ok_or_else(bad)?).ok_or_else(bad)?;
    Ok(Hunk {
        old_start,
        old_lines,
        new_start,
        new_lines,
        added: Vec::new(),
    })
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}
