//! Error types for block content processing

use thiserror::Error;

/// Errors surfaced while migrating, tree-building or rendering block content
///
/// These are deterministic logic or configuration errors and are always
/// propagated to the caller; nothing in this crate retries or recovers
/// locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input did not have the shape the operation requires
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Migration was asked for a target version this crate does not implement
    #[error("unsupported block content version: {0}")]
    UnsupportedVersion(u32),

    /// Rendering configuration is incomplete for the given content
    #[error("{0}")]
    Config(String),
}
