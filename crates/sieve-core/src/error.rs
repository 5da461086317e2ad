/// Errors that can occur across sieve.
///
/// Library crates return this type directly; the binary converts it to a
/// `miette::Report` at the boundary. [`SieveError::Config`] and
/// [`SieveError::Toml`] are raised during pre-flight, before anything is
/// posted.
/// [`SieveError::Repository`] is recoverable and is caught per comment or
/// per file by the publishing code.
///
/// # Examples
///
/// ```
/// use sieve_core::SieveError;
///
/// let err = SieveError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// assert!(matches!(err, SieveError::Config(_)));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum SieveError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(help("check .sieve.toml and the SIEVE_* / GITHUB_* environment variables"))]
    Config(String),

    /// Git command failure.
    #[error("git error: {0}")]
    Git(String),

    /// Non-success response from the review host.
    #[error("repository error: {0}")]
    Repository(String),

    /// Unified diff parsing failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// LLM API or response error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
