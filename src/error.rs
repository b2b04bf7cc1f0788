//! Error types for commit-gate modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading layered configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadEnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Errors from compiling a single ignore pattern.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PatternError {
    #[error("Ignore pattern is empty")]
    Empty,

    #[error("Ignore pattern '{pattern}' compiled to an invalid expression: {message}")]
    InvalidExpression { pattern: String, message: String },
}

/// Errors from reading ignore files.
#[derive(Error, Debug)]
pub enum IgnoreError {
    #[error("Failed to read ignore file {0}: {1}")]
    ReadFailed(PathBuf, #[source] std::io::Error),
}

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Repository has no working directory (bare repository)")]
    BareRepository,

    #[error("Failed to collect staged diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to read git config: {0}")]
    ConfigFailed(#[source] git2::Error),
}

/// Errors from the remote review service.
///
/// Each variant maps onto a retry class, see [`crate::llm::retry::Classify`].
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Review service rejected the credentials (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("Review service rate limited the request: {body}")]
    RateLimited { body: String },

    #[error("Review service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Review request timed out after {0} ms")]
    Timeout(u64),

    #[error("Failed to reach review service: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Review service returned an unreadable envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Review service returned an empty completion")]
    EmptyCompletion,
}

/// Errors that end a review run early without a verdict.
///
/// The orchestrator treats all of these as fail-open.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Ignore(#[from] IgnoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Review response was malformed ({problem}): {raw}")]
    MalformedResponse { raw: String, problem: String },

    #[error("Failed to write commit message file {0}: {1}")]
    WriteMessage(PathBuf, #[source] std::io::Error),
}

/// Errors from installing or removing the git hook and scaffolding files.
#[derive(Error, Debug)]
pub enum HookError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error("{0} already exists and was not written by commit-gate. Use --force to replace it.")]
    ForeignHook(PathBuf),

    #[error("{0} already exists. Use --force to overwrite it.")]
    FileExists(PathBuf),

    #[error("I/O error on {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
}
