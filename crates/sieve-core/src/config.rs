use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::env::Env;
use crate::error::SieveError;

/// Marker written into the PR description (or summary comment) so later runs
/// can find and replace their own block.
pub const DEFAULT_SUMMARY_MARKER: &str = "<!-- sieve:summary -->";

/// Top-level configuration loaded from `.sieve.toml`.
///
/// Resolution order: CLI flags > env vars > config file > defaults.
///
/// # Examples
///
/// ```
/// use sieve_core::SieveConfig;
///
/// let config = SieveConfig::default();
/// assert_eq!(config.llm.model, "gpt-4o-mini");
/// assert!(config.summary.enabled);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SieveConfig {
    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Review behavior settings.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Summary block settings.
    #[serde(default)]
    pub summary: SummaryConfig,
    /// GitHub access.
    #[serde(default)]
    pub github: GitHubConfig,
}

impl SieveConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::Io`] if the file cannot be read, or
    /// [`SieveError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sieve_core::SieveConfig;
    /// use std::path::Path;
    ///
    /// let config = SieveConfig::from_file(Path::new(".sieve.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, SieveError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use sieve_core::SieveConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// target_extensions = ["py", "rs"]
    /// "#;
    /// let config = SieveConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.target_extensions, vec!["py", "rs"]);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, SieveError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Overlay values from environment variables.
    ///
    /// Env values win over the file. Recognised variables: `SIEVE_MODEL`,
    /// `SIEVE_API_KEY` (falling back to `OPENAI_API_KEY`), `SIEVE_BASE_URL`,
    /// `SIEVE_TARGET_EXTENSIONS` (comma separated) and `GITHUB_TOKEN`
    /// (falling back to `GH_TOKEN`).
    ///
    /// # Examples
    ///
    /// ```
    /// use sieve_core::{Env, SieveConfig};
    ///
    /// let env = Env::mock([("SIEVE_MODEL", "gpt-4.1"), ("GH_TOKEN", "ghp_x")]);
    /// let config = SieveConfig::default().with_env(&env);
    /// assert_eq!(config.llm.model, "gpt-4.1");
    /// assert_eq!(config.github.token.as_deref(), Some("ghp_x"));
    /// ```
    pub fn with_env(mut self, env: &Env) -> Self {
        if let Some(model) = env.get("SIEVE_MODEL") {
            self.llm.model = model;
        }
        if let Some(key) = env.first_of(&["SIEVE_API_KEY", "OPENAI_API_KEY"]) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = env.get("SIEVE_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(exts) = env.get("SIEVE_TARGET_EXTENSIONS") {
            self.review.target_extensions = exts
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_string())
                .filter(|e| !e.is_empty())
                .collect();
        }
        if let Some(token) = env.first_of(&["GITHUB_TOKEN", "GH_TOKEN"]) {
            self.github.token = Some(token);
        }
        self
    }

    /// Check that everything needed to talk to the model and the host is
    /// present.
    ///
    /// Called before the first remote mutation so a misconfigured run posts
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::Config`] naming the first missing value.
    pub fn validate_for_posting(&self) -> Result<(), SieveError> {
        self.validate_for_model()?;
        if self.github.token.is_none() {
            return Err(SieveError::Config(
                "no GitHub token configured (set GITHUB_TOKEN or [github].token)".into(),
            ));
        }
        Ok(())
    }

    /// Check that the model can be called.
    ///
    /// Local providers (`ollama`) and explicit base URLs run without a key.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::Config`] if no API key is available.
    pub fn validate_for_model(&self) -> Result<(), SieveError> {
        if self.llm.api_key.is_none() && self.llm.provider != "ollama" && self.llm.base_url.is_none()
        {
            return Err(SieveError::Config(
                "no LLM API key configured (set SIEVE_API_KEY or [llm].api_key)".into(),
            ));
        }
        if self.summary.marker.trim().is_empty() {
            return Err(SieveError::Config("[summary].marker must not be empty".into()));
        }
        Ok(())
    }
}

/// LLM provider configuration.
///
/// # Examples
///
/// ```
/// use sieve_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.provider, "openai");
/// assert_eq!(config.timeout_secs, 120);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name (`"openai"` or `"ollama"`); both speak the
    /// OpenAI-compatible chat completions API.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "openai".into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Review behavior configuration.
///
/// # Examples
///
/// ```
/// use sieve_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert!(config.target_extensions.is_empty());
/// assert_eq!(config.snippet_context_lines, 2);
/// assert!(!config.drop_speculative);
/// assert!(config.post_no_issues);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Only review files with these extensions. Empty means every file.
    #[serde(default)]
    pub target_extensions: Vec<String>,
    /// Glob patterns of paths to skip.
    #[serde(default)]
    pub skip_patterns: Vec<String>,
    /// Lines of context shown around a line-anchored comment (default: 2).
    #[serde(default = "default_snippet_context_lines")]
    pub snippet_context_lines: usize,
    /// Drop findings that only speculate about "potential" problems.
    #[serde(default)]
    pub drop_speculative: bool,
    /// Post an acknowledgement comment for files with no findings (default: true).
    #[serde(default = "default_true")]
    pub post_no_issues: bool,
    /// Appended to the system instructions.
    pub extra_instructions: Option<String>,
    /// Cap on the file text sent with each prompt, in characters.
    pub max_file_chars: Option<usize>,
}

fn default_snippet_context_lines() -> usize {
    2
}

fn default_true() -> bool {
    true
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            target_extensions: Vec::new(),
            skip_patterns: Vec::new(),
            snippet_context_lines: default_snippet_context_lines(),
            drop_speculative: false,
            post_no_issues: true,
            extra_instructions: None,
            max_file_chars: None,
        }
    }
}

/// Where the run summary is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryTarget {
    /// Inside the pull request description.
    #[default]
    Description,
    /// In a dedicated conversation comment.
    Comment,
}

/// Summary block configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Token identifying the managed block. Must not occur in human text.
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_heading")]
    pub heading: String,
    #[serde(default)]
    pub target: SummaryTarget,
}

fn default_marker() -> String {
    DEFAULT_SUMMARY_MARKER.into()
}

fn default_heading() -> String {
    "AI Review Summary".into()
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            marker: default_marker(),
            heading: default_heading(),
            target: SummaryTarget::default(),
        }
    }
}

/// GitHub access configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Personal access or Actions token.
    pub token: Option<String>,
    /// API root for GitHub Enterprise, e.g. `https://ghe.example.com/api/v3`.
    pub api_base: Option<String>,
}
