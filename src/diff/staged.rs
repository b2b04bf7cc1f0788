//! Staged changeset collection using git2.

use std::path::{Path, PathBuf};

use git2::{DiffFindOptions, DiffFormat, ErrorCode, Repository, Tree};
use tracing::{debug, warn};

use crate::error::GitError;

/// Where the orchestrator gets the staged changeset from.
pub trait StagedSource {
    /// Root of the working tree (ignore and env files live here).
    fn workdir(&self) -> &Path;

    /// Unified diff of the index against HEAD, like `git diff --cached`.
    fn staged_diff(&self) -> Result<String, GitError>;
}

/// How the repository was located, so later reads open it the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RepoLocation {
    /// `GIT_DIR`, `GIT_WORK_TREE` and `GIT_INDEX_FILE` apply. git sets
    /// the last one to a temporary index for `commit -a` and
    /// `commit <paths>`.
    Env,
    Path(PathBuf),
}

/// [`StagedSource`] backed by a real repository.
#[derive(Debug, Clone)]
pub struct GitStagedSource {
    workdir: PathBuf,
    location: RepoLocation,
}

impl GitStagedSource {
    /// Locate the repository the way git hooks see it (`GIT_DIR` aware).
    pub fn from_env() -> Result<Self, GitError> {
        let repo = Repository::open_from_env().map_err(GitError::OpenRepository)?;
        Self::from_repository(&repo, RepoLocation::Env)
    }

    /// Open the repository containing `path`.
    pub fn discover(path: &Path) -> Result<Self, GitError> {
        let repo = Repository::discover(path).map_err(GitError::OpenRepository)?;
        Self::from_repository(&repo, RepoLocation::Path(repo.path().to_path_buf()))
    }

    fn from_repository(repo: &Repository, location: RepoLocation) -> Result<Self, GitError> {
        let workdir = repo.workdir().ok_or(GitError::BareRepository)?;
        Ok(Self {
            workdir: workdir.to_path_buf(),
            location,
        })
    }

    fn open(&self) -> Result<Repository, GitError> {
        match &self.location {
            RepoLocation::Env => Repository::open_from_env(),
            RepoLocation::Path(git_dir) => Repository::open(git_dir),
        }
        .map_err(GitError::OpenRepository)
    }
}

impl StagedSource for GitStagedSource {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn staged_diff(&self) -> Result<String, GitError> {
        collect_staged_diff(&self.open()?)
    }
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found),
/// `Ok(Some(tree))` for repos with a valid HEAD, or `Err(GitError::DiffFailed)`
/// for real errors (corrupt HEAD, permission issues, missing objects).
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(GitError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(GitError::DiffFailed)?;
    Ok(Some(tree))
}

/// Render the staged changes (HEAD tree → index) as a unified diff.
///
/// Renames are detected so that a moved file is reviewed under its new path.
pub fn collect_staged_diff(repo: &Repository) -> Result<String, GitError> {
    let head_tree = resolve_head_tree(repo)?;

    let mut diff = repo
        .diff_tree_to_index(head_tree.as_ref(), None, None)
        .map_err(GitError::DiffFailed)?;

    let mut find = DiffFindOptions::new();
    find.renames(true);
    diff.find_similar(Some(&mut find))
        .map_err(GitError::DiffFailed)?;

    debug!("Staged diff touches {} files", diff.deltas().len());

    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        match std::str::from_utf8(line.content()) {
            Ok(content) => text.push_str(content),
            Err(_) => {
                warn!("Skipping non-UTF-8 diff line");
                text.push('\n');
            }
        }
        true
    })
    .map_err(GitError::DiffFailed)?;

    Ok(text)
}
