//! commit-gate - CLI entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use git2::Repository;

use commit_gate::config::{REPO_ENV_FILE, ResolvedConfig, load_layered, user_env_file};
use commit_gate::diff::{GitStagedSource, StagedSource};
use commit_gate::gate::{self, GateDecision};
use commit_gate::hook::{self, HookPaths, InstallAction, UninstallAction};
use commit_gate::ignore::load_rules;
use commit_gate::llm::HttpChatClient;
use commit_gate::review::{HookInvocation, Orchestrator, ReviewOutcome, ShellBuildRunner, SkipReason};
use commit_gate::telemetry::init_tracing;

/// AI review gate for git commits.
#[derive(Parser, Debug)]
#[command(name = "commit-gate")]
#[command(about = "Review staged changes with an AI model before each commit")]
#[command(version)]
struct Cli {
    /// Verbose logging (same as AI_VERBOSE=1)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hook entry point: review staged changes and write the commit message
    Run {
        /// Commit message file git passes to the hook
        message_file: PathBuf,
        /// Commit source (message, template, merge, squash, commit)
        source: Option<String>,
        /// Commit object name for amend / reuse
        sha: Option<String>,
    },

    /// Install the prepare-commit-msg hook in the current repository
    Install {
        /// Replace an existing hook (it is kept as prepare-commit-msg.bak)
        #[arg(long)]
        force: bool,
    },

    /// Remove the hook, restoring any backed-up hook
    Uninstall,

    /// Write example .commit-gate.env and .commit-gate-ignore files
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Print the resolved configuration (API key masked)
    Config,

    /// Show whether paths are excluded from review
    CheckIgnore {
        /// Repository-relative paths
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            message_file,
            source,
            sha,
        } => {
            let invocation = HookInvocation::from_args(message_file, source.as_deref(), sha);
            return run_hook(invocation, cli.verbose).await;
        }
        command => {
            init_tracing(cli.verbose);
            match command {
                Command::Install { force } => install_hook(force),
                Command::Uninstall => uninstall_hook(),
                Command::Init { force } => init_repository(force),
                Command::Config => show_config(),
                Command::CheckIgnore { paths } => check_ignore(&paths),
                Command::Run { .. } => Ok(()),
            }
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// The hook run. Never fails: every problem maps to an outcome.
async fn run_hook(invocation: HookInvocation, verbose: bool) -> ExitCode {
    // Decided from the arguments alone, before touching the repository.
    if let GateDecision::Skip(reason) = gate::evaluate(&invocation.source) {
        init_tracing(verbose);
        ReviewOutcome::Skipped(SkipReason::Invocation(reason)).report();
        return ExitCode::SUCCESS;
    }

    let staged = match GitStagedSource::from_env() {
        Ok(staged) => staged,
        Err(e) => {
            init_tracing(verbose);
            ReviewOutcome::Unavailable(e.into()).report();
            return ExitCode::SUCCESS;
        }
    };

    let env = match load_layered(Some(staged.workdir())) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("commit-gate: {:#}; using the process environment only.", e);
            std::env::vars().collect()
        }
    };
    let config = ResolvedConfig::resolve(&env);
    init_tracing(verbose || config.verbose);

    let orchestrator = Orchestrator::new(config, staged, ShellBuildRunner);
    let outcome = orchestrator.run(&invocation, HttpChatClient::new).await;
    outcome.report();

    ExitCode::from(outcome.exit_code())
}

fn install_hook(force: bool) -> Result<()> {
    let repo = open_repository()?;
    let paths = HookPaths::for_repository(&repo)?;

    match hook::install(&paths, force)? {
        InstallAction::Installed => println!("✓ Installed {}", paths.hook_file.display()),
        InstallAction::Updated => println!("✓ Updated {}", paths.hook_file.display()),
        InstallAction::ReplacedForeign { backup } => println!(
            "✓ Installed {} (previous hook saved as {})",
            paths.hook_file.display(),
            backup.display()
        ),
    }
    Ok(())
}

fn uninstall_hook() -> Result<()> {
    let repo = open_repository()?;
    let paths = HookPaths::for_repository(&repo)?;

    match hook::uninstall(&paths)? {
        UninstallAction::Removed => println!("✓ Removed {}", paths.hook_file.display()),
        UninstallAction::RestoredBackup { from } => println!(
            "✓ Removed commit-gate hook and restored {}",
            from.display()
        ),
        UninstallAction::NotInstalled => println!("commit-gate hook is not installed"),
    }
    Ok(())
}

fn init_repository(force: bool) -> Result<()> {
    let repo = open_repository()?;

    for path in hook::init(workdir(&repo)?, force)? {
        println!("✓ Wrote {}", path.display());
    }
    println!("Set your API key in the environment or in {}.", REPO_ENV_FILE);
    Ok(())
}

fn show_config() -> Result<()> {
    // Also usable outside a repository.
    let repo = Repository::open_from_env().ok();
    let root = repo.as_ref().and_then(|r| r.workdir());
    let env = load_layered(root).context("Failed to load configuration")?;
    let config = ResolvedConfig::resolve(&env);

    println!("{}", config.describe());
    println!();
    print_source("user file:", user_env_file().as_deref());
    print_source("repo file:", root.map(|r| r.join(REPO_ENV_FILE)).as_deref());
    Ok(())
}

fn check_ignore(paths: &[String]) -> Result<()> {
    let repo = open_repository()?;
    let (rules, file) = load_rules(workdir(&repo)?)?;

    match file {
        Some(file) => println!("Rules: {} ({} patterns)", file.display(), rules.len()),
        None => println!("Rules: none (no ignore file found)"),
    }
    for path in paths {
        match rules.deciding_rule(path) {
            Some(rule) if rule.is_negated() => {
                println!("kept     {}  (re-included by '{}')", path, rule.source())
            }
            Some(rule) => println!("ignored  {}  ('{}')", path, rule.source()),
            None => println!("kept     {}", path),
        }
    }
    Ok(())
}

fn open_repository() -> Result<Repository> {
    Repository::open_from_env()
        .context("Not a git repository. Run commit-gate from within a git repository.")
}

fn workdir(repo: &Repository) -> Result<&Path> {
    repo.workdir()
        .context("Repository has no working directory (bare repository)")
}

fn print_source(label: &str, path: Option<&Path>) {
    match path {
        Some(p) if p.is_file() => println!("{:<11}{}", label, p.display()),
        Some(p) => println!("{:<11}{} (not found)", label, p.display()),
        None => println!("{:<11}(unavailable)", label),
    }
}
