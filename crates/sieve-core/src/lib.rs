//! Core types, configuration, and error handling for sieve.
//!
//! This crate provides the shared foundation used by the other sieve crates:
//! - [`SieveError`]: unified error type using `thiserror`
//! - [`SieveConfig`]: configuration loaded from `.sieve.toml`
//! - [`Env`]: environment lookups that tests can replace
//! - Shared types: [`ReviewRequest`], [`Completion`], [`LineComment`],
//!   [`PostedCommentRecord`], [`PullRequest`], [`PublishOutcome`], [`OutputFormat`]

mod config;
mod env;
mod error;
mod types;

pub use config::{
    GitHubConfig, LlmConfig, ReviewConfig, SieveConfig, SummaryConfig, SummaryTarget,
    DEFAULT_SUMMARY_MARKER,
};
pub use env::Env;
pub use error::SieveError;
pub use types::{
    CommentBatch, Completion, LineComment, LineTarget, OutputFormat, PostedCommentRecord,
    PublishOutcome, PublishTarget, PullRequest, ReviewRequest,
};

/// A convenience `Result` type for sieve operations.
pub type Result<T> = std::result::Result<T, SieveError>;
