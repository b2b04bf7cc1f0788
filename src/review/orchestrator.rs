//! The review pipeline run by the `prepare-commit-msg` hook.
//!
//! gate → bypass → credential → staged diff → ignore filter → build
//! → truncate → remote call (with retries) → verdict → message file.
//!
//! Only a failed build or a negative verdict blocks the commit. Anything
//! that goes wrong between reading the diff and applying the verdict is
//! reported and the commit is allowed without review.

use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use super::build::{BuildRunner, BuildStatus};
use super::verdict::{compose_message, parse_verdict, write_message_file};
use crate::config::{ResolvedConfig, keys};
use crate::diff::{StagedSource, partition_diff, truncate_chars};
use crate::error::{RemoteError, ReviewError};
use crate::gate::{self, CommitSource, GateDecision};
use crate::ignore::load_rules;
use crate::llm::{ChatBackend, RetryPolicy, build_user_message, call_with_retry};

/// Arguments git passes to `prepare-commit-msg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookInvocation {
    pub message_file: PathBuf,
    pub source: CommitSource,
    /// Commit object name, given with `-c`, `-C` or `--amend`.
    pub sha: Option<String>,
}

impl HookInvocation {
    pub fn from_args(message_file: PathBuf, source: Option<&str>, sha: Option<String>) -> Self {
        Self {
            message_file,
            source: CommitSource::from_hook_arg(source),
            sha,
        }
    }
}

/// Why a run ended without a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Invocation(String),
    Bypassed,
    MissingCredential { env_key: &'static str },
    NoStagedChanges,
    AllFiltered,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Invocation(reason) => write!(f, "{}", reason),
            SkipReason::Bypassed => write!(f, "{} is set", keys::REVIEW_SKIP),
            SkipReason::MissingCredential { env_key } => write!(
                f,
                "no API key configured (set {} or {})",
                env_key,
                keys::API_KEY
            ),
            SkipReason::NoStagedChanges => write!(f, "no staged changes"),
            SkipReason::AllFiltered => write!(f, "all staged changes are excluded by ignore rules"),
        }
    }
}

/// Terminal state of one run.
#[derive(Debug)]
pub enum ReviewOutcome {
    Skipped(SkipReason),
    Passed { message: String },
    Rejected { reason: String },
    BuildFailed { code: Option<i32> },
    /// Fail-open: the review could not be completed.
    Unavailable(ReviewError),
}

impl ReviewOutcome {
    pub fn blocks_commit(&self) -> bool {
        matches!(
            self,
            ReviewOutcome::Rejected { .. } | ReviewOutcome::BuildFailed { .. }
        )
    }

    /// Hook exit status: non-zero aborts the commit.
    pub fn exit_code(&self) -> u8 {
        if self.blocks_commit() { 1 } else { 0 }
    }

    /// Print the user-facing summary to stderr.
    pub fn report(&self) {
        match self {
            ReviewOutcome::Skipped(reason @ SkipReason::MissingCredential { .. }) => {
                eprintln!("commit-gate: {}; skipping AI review.", reason);
            }
            ReviewOutcome::Skipped(reason) => {
                eprintln!("commit-gate: skipping AI review: {}.", reason);
            }
            ReviewOutcome::Passed { .. } => {
                eprintln!("commit-gate: review passed; commit message written.");
            }
            ReviewOutcome::Rejected { reason } => {
                let reason = if reason.trim().is_empty() {
                    "(no reason given)"
                } else {
                    reason.trim()
                };
                eprintln!("commit-gate: review failed: {}", reason);
                eprintln!(
                    "commit-gate: fix the issue, or bypass once with `{}=1 git commit ...`.",
                    keys::REVIEW_SKIP
                );
            }
            ReviewOutcome::BuildFailed { code } => match code {
                Some(code) => eprintln!(
                    "commit-gate: build command failed with exit code {}; commit blocked.",
                    code
                ),
                None => eprintln!("commit-gate: build command did not complete; commit blocked."),
            },
            ReviewOutcome::Unavailable(e) => {
                eprintln!(
                    "commit-gate: review unavailable ({}); allowing commit without review.",
                    e
                );
            }
        }
    }
}

/// Composes the review pipeline over its collaborators.
pub struct Orchestrator<S, R> {
    config: ResolvedConfig,
    source: S,
    build: R,
}

impl<S: StagedSource, R: BuildRunner> Orchestrator<S, R> {
    pub fn new(config: ResolvedConfig, source: S, build: R) -> Self {
        Self {
            config,
            source,
            build,
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Run the pipeline once.
    ///
    /// `connect` builds the chat backend; it is only called once a diff
    /// worth reviewing exists.
    pub async fn run<B, F>(&self, invocation: &HookInvocation, connect: F) -> ReviewOutcome
    where
        B: ChatBackend,
        F: FnOnce(&ResolvedConfig) -> Result<B, RemoteError>,
    {
        if let GateDecision::Skip(reason) = gate::evaluate(&invocation.source) {
            return ReviewOutcome::Skipped(SkipReason::Invocation(reason));
        }

        if self.config.review_skip {
            return ReviewOutcome::Skipped(SkipReason::Bypassed);
        }

        if !self.config.has_credential() {
            return ReviewOutcome::Skipped(SkipReason::MissingCredential {
                env_key: self.config.credential_hint(),
            });
        }

        match self.review(invocation, connect).await {
            Ok(outcome) => outcome,
            Err(e) => ReviewOutcome::Unavailable(e),
        }
    }

    async fn review<B, F>(
        &self,
        invocation: &HookInvocation,
        connect: F,
    ) -> Result<ReviewOutcome, ReviewError>
    where
        B: ChatBackend,
        F: FnOnce(&ResolvedConfig) -> Result<B, RemoteError>,
    {
        let diff = self.source.staged_diff()?;
        if diff.trim().is_empty() {
            return Ok(ReviewOutcome::Skipped(SkipReason::NoStagedChanges));
        }

        let workdir = self.source.workdir();
        let (rules, _) = load_rules(workdir)?;

        let filtered = partition_diff(&diff, &rules);
        if !filtered.dropped.is_empty() {
            eprintln!(
                "commit-gate: excluding {} file(s) from review: {}",
                filtered.dropped.len(),
                filtered.dropped.join(", ")
            );
        }
        if filtered.text.trim().is_empty() {
            return Ok(ReviewOutcome::Skipped(SkipReason::AllFiltered));
        }

        if let Some(command) = self.config.effective_build_command() {
            eprintln!("commit-gate: running build command: {}", command);
            if let BuildStatus::Failed { code } = self.build.run(command, workdir).await {
                return Ok(ReviewOutcome::BuildFailed { code });
            }
        }

        let capped = truncate_chars(&filtered.text, self.config.max_diff_size);
        if capped.truncated {
            eprintln!(
                "commit-gate: diff is {} characters; only the first {} are reviewed.",
                capped.original_chars, self.config.max_diff_size
            );
        }

        let user_message = build_user_message(&capped.text, capped.truncated);
        let backend = connect(&self.config)?;
        let policy = RetryPolicy::from_config(&self.config);

        debug!(
            "Requesting review from {} ({}), up to {} attempts",
            self.config.provider, self.config.model, policy.max_attempts
        );
        let raw = call_with_retry(&policy, || backend.complete(&user_message)).await?;

        let verdict = parse_verdict(&raw).into_result()?;
        if !verdict.is_passed {
            return Ok(ReviewOutcome::Rejected {
                reason: verdict.reason,
            });
        }

        let message = compose_message(&verdict, self.config.append_reason);
        write_message_file(&invocation.message_file, &message)?;
        Ok(ReviewOutcome::Passed { message })
    }
}
