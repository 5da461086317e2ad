//! Review orchestration: from model reply to published pull request comments.
//!
//! The pieces line up with one run of the bot:
//! [`prompt`] builds the request, [`llm`] sends it, [`sentinel`] and
//! [`parser`] interpret the reply, [`dedup`] drops what is already on the
//! PR, [`publish`] posts the rest through a [`host::ReviewHost`], and
//! [`summary`] keeps the single managed block in the PR description up to
//! date. [`pipeline`] strings them together per file.

pub mod dedup;
pub mod event;
pub mod github;
pub mod host;
pub mod llm;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod publish;
pub mod render;
pub mod sentinel;
pub mod source;
pub mod speculative;
pub mod summary;
