use sieve_core::{ReviewConfig, ReviewRequest};

use crate::llm::{ChatMessage, Role};
use crate::sentinel::NO_ISSUES_PHRASE;

const INSTRUCTIONS: &str = "\
You are a senior code reviewer. You are given the diff of one file from a \
pull request together with the full file, with line numbers.

Rules:
- Only report problems you are confident are real
- Refer to line numbers of the full file, not of the diff
- Do not comment on formatting or naming unless it causes a bug
- Keep each finding to one or two sentences";

const DEFAULT_FOCUS: &[&str] = &[
    "bugs and logic errors",
    "security vulnerabilities",
    "error handling",
    "performance problems",
];

/// Fixed wording of the review request.
///
/// Built once from configuration and shared by every file of a run.
///
/// # Examples
///
/// ```
/// use sieve_review::prompt::PromptTemplate;
///
/// let template = PromptTemplate::default();
/// assert_eq!(template.no_issues_phrase, "No critical issues found");
/// assert!(template.extra_instructions.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    /// System message text.
    pub instructions: String,
    /// What the model must answer when it finds nothing.
    pub no_issues_phrase: String,
    pub focus_areas: Vec<String>,
    /// Repository-specific guidance appended to the instructions.
    pub extra_instructions: Option<String>,
    /// Truncate the full file to this many characters.
    pub max_file_chars: Option<usize>,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            instructions: INSTRUCTIONS.to_string(),
            no_issues_phrase: NO_ISSUES_PHRASE.to_string(),
            focus_areas: DEFAULT_FOCUS.iter().map(|s| s.to_string()).collect(),
            extra_instructions: None,
            max_file_chars: None,
        }
    }
}

impl PromptTemplate {
    /// Default template with the `[review]` overrides applied.
    pub fn from_config(config: &ReviewConfig) -> Self {
        Self {
            extra_instructions: config.extra_instructions.clone(),
            max_file_chars: config.max_file_chars,
            ..Self::default()
        }
    }
}

/// Builds the chat messages for one [`ReviewRequest`].
///
/// # Examples
///
/// ```
/// use sieve_core::ReviewRequest;
/// use sieve_review::prompt::{PromptBuilder, PromptTemplate};
///
/// let builder = PromptBuilder::new(PromptTemplate::default());
/// let req = ReviewRequest::new("db.py", "q = input()\n", "+q = input()");
/// let messages = builder.build(&req);
/// assert_eq!(messages.len(), 2);
/// assert!(messages[1].content.contains("1 | q = input()"));
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: PromptTemplate,
}

impl PromptBuilder {
    pub fn new(template: PromptTemplate) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// System and user messages for `request`.
    pub fn build(&self, request: &ReviewRequest) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: Role::System,
                content: self.system_message(),
            },
            ChatMessage {
                role: Role::User,
                content: self.user_message(request),
            },
        ]
    }

    fn system_message(&self) -> String {
        let t = &self.template;
        let mut out = t.instructions.trim_end().to_string();
        if !t.focus_areas.is_empty() {
            out.push_str("\n\nFocus on:\n");
            for area in &t.focus_areas {
                out.push_str(&format!("- {area}\n"));
            }
        }
        out.push_str(&format!(
            "\nAnswer with one finding per line, in exactly this format:\n\
             line_number : [Type of Issue] Description\n\n\
             For example:\n\
             42 : [Security] User input is concatenated into the SQL query\n\n\
             If there is nothing worth reporting, answer exactly: {}",
            t.no_issues_phrase
        ));
        if let Some(extra) = t.extra_instructions.as_deref().filter(|s| !s.trim().is_empty()) {
            out.push_str("\n\nAdditional instructions:\n");
            out.push_str(extra.trim());
        }
        out
    }

    fn user_message(&self, request: &ReviewRequest) -> String {
        let (file_text, truncated) = match self.template.max_file_chars {
            Some(max) if request.file_text.chars().count() > max => {
                (request.file_text.chars().take(max).collect::<String>(), true)
            }
            _ => (request.file_text.clone(), false),
        };

        let width = request.max_line_number().max(1).to_string().len();
        let numbered: Vec<String> = file_text
            .lines()
            .enumerate()
            .map(|(i, line)| format!("{:>width$} | {line}", i + 1))
            .collect();

        let mut out = format!(
            "File: {}\n\nDiff:\n```diff\n{}\n```\n\nFull file:\n```\n{}\n```\n",
            request.file_path,
            request.diff_text.trim_end(),
            numbered.join("\n"),
        );
        if truncated {
            out.push_str("\n(The file was truncated; only comment on the lines shown.)\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ReviewRequest {
        ReviewRequest::new(
            "app/db.py",
            "import sqlite3\n\ndef find(conn, name):\n    return conn.execute(q)\n",
            "@@ -1 +1 @@\n+    return conn.execute(q)\n",
        )
    }

    #[test]
    fn system_message_describes_format_and_sentinel() {
        let messages = PromptBuilder::new(PromptTemplate::default()).build(&request());
        assert_eq!(messages[0].role, Role::System);
        let system = &messages[0].content;
        assert!(system.contains("line_number : [Type of Issue] Description"));
        assert!(system.ends_with("answer exactly: No critical issues found"));
        assert!(system.contains("- security vulnerabilities"));
    }

    #[test]
    fn user_message_has_diff_and_numbered_file() {
        let messages = PromptBuilder::new(PromptTemplate::default()).build(&request());
        let user = &messages[1].content;
        assert!(user.starts_with("File: app/db.py"));
        assert!(user.contains("```diff\n@@ -1 +1 @@\n+    return conn.execute(q)\n```"));
        assert!(user.contains("1 | import sqlite3"));
        assert!(user.contains("2 | \n"));
        assert!(user.contains("4 |     return conn.execute(q)"));
    }

    #[test]
    fn extra_instructions_and_custom_phrase() {
        let template = PromptTemplate {
            no_issues_phrase: "LGTM".into(),
            extra_instructions: Some("Flag any use of eval.".into()),
            focus_areas: Vec::new(),
            ..PromptTemplate::default()
        };
        let system = &PromptBuilder::new(template).build(&request())[0].content;
        assert!(system.contains("answer exactly: LGTM"));
        assert!(system.ends_with("Additional instructions:\nFlag any use of eval."));
        assert!(!system.contains("Focus on:"));
    }

    #[test]
    fn long_files_are_truncated() {
        let template = PromptTemplate {
            max_file_chars: Some(10),
            ..PromptTemplate::default()
        };
        let user = &PromptBuilder::new(template).build(&request())[1].content;
        assert!(user.contains("1 | import sql\n```"));
        assert!(user.contains("truncated"));
    }

    #[test]
    fn line_numbers_are_right_aligned() {
        let text: String = (1..=12).map(|i| format!("l{i}\n")).collect();
        let req = ReviewRequest::new("a.txt", text, "+l12");
        let user = &PromptBuilder::new(PromptTemplate::default()).build(&req)[1].content;
        assert!(user.contains(" 1 | l1\n"));
        assert!(user.contains("12 | l12\n"));
    }

    #[test]
    fn from_config_copies_overrides() {
        let config = ReviewConfig {
            extra_instructions: Some("x".into()),
            max_file_chars: Some(5),
            ..ReviewConfig::default()
        };
        let t = PromptTemplate::from_config(&config);
        assert_eq!(t.extra_instructions.as_deref(), Some("x"));
        assert_eq!(t.max_file_chars, Some(5));
        assert_eq!(t.instructions, PromptTemplate::default().instructions);
    }
}
