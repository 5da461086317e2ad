//! Unified diff splitting and per-file filtering.
//!
//! [`parser`] turns the output of `git diff` (or a GitHub `.diff` download)
//! into one [`parser::FileDiff`] per touched file, keeping each file's raw
//! diff text so it can be handed to the model verbatim. [`filter`] decides
//! which of those files are worth reviewing.

pub mod filter;
pub mod parser;
