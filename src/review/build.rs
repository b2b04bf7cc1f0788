//! Pre-review build/check command.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

/// Outcome of the build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Passed,
    /// Non-zero exit, killed by a signal (`code: None`), or the shell could
    /// not be started.
    Failed { code: Option<i32> },
}

/// Runs the configured build command.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BuildRunner: Send + Sync {
    async fn run(&self, command: &str, workdir: &Path) -> BuildStatus;
}

/// Runs the command through the platform shell with inherited stdio, so
/// compiler output shows up in the terminal running `git commit`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellBuildRunner;

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

#[async_trait]
impl BuildRunner for ShellBuildRunner {
    async fn run(&self, command: &str, workdir: &Path) -> BuildStatus {
        debug!("Running build command in {}: {}", workdir.display(), command);

        let status = shell_command(command)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await;

        match status {
            Ok(s) if s.success() => BuildStatus::Passed,
            Ok(s) => BuildStatus::Failed { code: s.code() },
            Err(e) => {
                warn!("Failed to start build command '{}': {}", command, e);
                BuildStatus::Failed { code: None }
            }
        }
    }
}
