//! Decide from the hook arguments whether a review applies at all.
//!
//! git passes `prepare-commit-msg` a second argument describing where the
//! message came from. Only commits whose message is still to be written by
//! the user get reviewed.

use std::fmt;

/// How the enclosing commit was invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitSource {
    /// No source argument: plain interactive `git commit`.
    Interactive,
    /// `-m` / `-F`.
    Message,
    /// `-t` or `commit.template`.
    Template,
    /// Merge commit or `.git/MERGE_MSG` present.
    Merge,
    /// `.git/SQUASH_MSG` present.
    Squash,
    /// `-c`, `-C` or `--amend`.
    Commit,
    /// Anything git may add later.
    Other(String),
}

impl CommitSource {
    /// Parse the hook's second argument.
    pub fn from_hook_arg(arg: Option<&str>) -> Self {
        match arg.map(str::trim) {
            None | Some("") => Self::Interactive,
            Some("message") => Self::Message,
            Some("template") => Self::Template,
            Some("merge") => Self::Merge,
            Some("squash") => Self::Squash,
            Some("commit") => Self::Commit,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for CommitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitSource::Interactive => write!(f, "interactive"),
            CommitSource::Message => write!(f, "message"),
            CommitSource::Template => write!(f, "template"),
            CommitSource::Merge => write!(f, "merge"),
            CommitSource::Squash => write!(f, "squash"),
            CommitSource::Commit => write!(f, "commit"),
            CommitSource::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Gate result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Skip(String),
}

/// Classify the invocation. Pure; performs no I/O.
pub fn evaluate(source: &CommitSource) -> GateDecision {
    match source {
        CommitSource::Interactive | CommitSource::Template => GateDecision::Proceed,
        CommitSource::Message => {
            GateDecision::Skip("commit message was supplied on the command line".to_string())
        }
        CommitSource::Merge => GateDecision::Skip("merge commit".to_string()),
        CommitSource::Squash => GateDecision::Skip("squash commit".to_string()),
        CommitSource::Commit => {
            GateDecision::Skip("amend or reuse of an existing commit message".to_string())
        }
        CommitSource::Other(s) => GateDecision::Skip(format!("unrecognized commit source '{}'", s)),
    }
}
