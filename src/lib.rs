//! commit-gate - an AI review gate for `git commit`.
//!
//! # Overview
//!
//! Installed as a `prepare-commit-msg` hook, commit-gate sends the staged
//! diff (minus ignored files) to an OpenAI-compatible chat model. A passing
//! review replaces the commit message with the model's conventional commit
//! message; a failing review aborts the commit. When the review cannot be
//! completed the commit goes ahead unreviewed.

pub mod config;
pub mod diff;
pub mod error;
pub mod gate;
pub mod hook;
pub mod ignore;
pub mod llm;
pub mod review;
pub mod telemetry;

// Re-export commonly used types
pub use config::{EnvMap, ResolvedConfig};
pub use error::{
    ConfigError, GitError, HookError, IgnoreError, PatternError, RemoteError, ReviewError,
};
pub use gate::{CommitSource, GateDecision};
pub use ignore::{IgnoreRule, RuleSet};
pub use llm::{ChatBackend, HttpChatClient, RetryPolicy};
pub use review::{
    HookInvocation, Orchestrator, ParsedResponse, ReviewOutcome, ReviewVerdict, ShellBuildRunner,
    SkipReason,
};
