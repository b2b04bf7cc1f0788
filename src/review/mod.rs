//! Review orchestration: build step, verdict handling and the pipeline.

pub mod build;
pub mod orchestrator;
pub mod verdict;

pub use build::{BuildRunner, BuildStatus, ShellBuildRunner};
pub use orchestrator::{HookInvocation, Orchestrator, ReviewOutcome, SkipReason};
pub use verdict::{
    CommitHeader, CommitType, NOTES_HEADER, ParsedResponse, ReviewVerdict, compose_message,
    parse_commit_header, parse_verdict, write_message_file,
};
