//! Installing and removing the `prepare-commit-msg` hook script.

use std::fs;
use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::debug;

use crate::error::{GitError, HookError};

pub const HOOK_NAME: &str = "prepare-commit-msg";

/// Line identifying a script written by `commit-gate install`.
pub const HOOK_MARKER: &str = "# installed by commit-gate";

/// Script body; git runs it with the message file, source and sha.
pub const HOOK_SCRIPT: &str = "#!/bin/sh
# installed by commit-gate
# Reviews staged changes before the commit message editor opens.
# Bypass once with: AI_REVIEW_SKIP=1 git commit
exec commit-gate run \"$@\"
";

/// Where the hook lives for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookPaths {
    pub hooks_dir: PathBuf,
    pub hook_file: PathBuf,
    pub backup_file: PathBuf,
}

impl HookPaths {
    /// Resolve the hooks directory, honouring `core.hooksPath`.
    ///
    /// A relative `core.hooksPath` is taken relative to the work tree, as
    /// git does.
    pub fn for_repository(repo: &Repository) -> Result<Self, HookError> {
        let config = repo.config().map_err(GitError::ConfigFailed)?;

        let hooks_dir = match config.get_path("core.hooksPath") {
            Ok(path) if path.is_absolute() => path,
            Ok(path) => repo.workdir().unwrap_or_else(|| repo.path()).join(path),
            Err(e) if e.code() == git2::ErrorCode::NotFound => common_dir(repo)?.join("hooks"),
            Err(e) => return Err(GitError::ConfigFailed(e).into()),
        };

        Ok(Self::in_dir(hooks_dir))
    }

    pub fn in_dir(hooks_dir: PathBuf) -> Self {
        Self {
            hook_file: hooks_dir.join(HOOK_NAME),
            backup_file: hooks_dir.join(format!("{}.bak", HOOK_NAME)),
            hooks_dir,
        }
    }
}

/// The git directory shared by all worktrees.
///
/// A linked worktree's git dir names the shared one in its `commondir`
/// file, relative to itself unless absolute.
fn common_dir(repo: &Repository) -> Result<PathBuf, HookError> {
    let git_dir = repo.path();
    if !repo.is_worktree() {
        return Ok(git_dir.to_path_buf());
    }

    let pointer = git_dir.join("commondir");
    let target = fs::read_to_string(&pointer).map_err(|e| HookError::Io(pointer.clone(), e))?;
    let common = git_dir.join(target.trim());
    common.canonicalize().map_err(|e| HookError::Io(common, e))
}

/// What [`install`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallAction {
    Installed,
    /// Our own script was rewritten in place.
    Updated,
    /// A foreign hook was moved aside first.
    ReplacedForeign { backup: PathBuf },
}

/// What [`uninstall`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallAction {
    Removed,
    RestoredBackup { from: PathBuf },
    NotInstalled,
}

/// Whether `path` holds a script written by us.
pub fn is_our_hook(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|content| content.lines().any(|l| l.trim() == HOOK_MARKER))
        .unwrap_or(false)
}

/// Write the hook script.
///
/// A foreign hook is only replaced with `force`, and is then kept as
/// `prepare-commit-msg.bak`.
pub fn install(paths: &HookPaths, force: bool) -> Result<InstallAction, HookError> {
    fs::create_dir_all(&paths.hooks_dir).map_err(|e| HookError::Io(paths.hooks_dir.clone(), e))?;

    let action = if !paths.hook_file.exists() {
        InstallAction::Installed
    } else if is_our_hook(&paths.hook_file) {
        InstallAction::Updated
    } else if force {
        fs::rename(&paths.hook_file, &paths.backup_file)
            .map_err(|e| HookError::Io(paths.backup_file.clone(), e))?;
        debug!("Moved existing hook to {}", paths.backup_file.display());
        InstallAction::ReplacedForeign {
            backup: paths.backup_file.clone(),
        }
    } else {
        return Err(HookError::ForeignHook(paths.hook_file.clone()));
    };

    fs::write(&paths.hook_file, HOOK_SCRIPT)
        .map_err(|e| HookError::Io(paths.hook_file.clone(), e))?;
    make_executable(&paths.hook_file)?;

    Ok(action)
}

/// Remove our hook, restoring a backed-up foreign hook if there is one.
pub fn uninstall(paths: &HookPaths) -> Result<UninstallAction, HookError> {
    if !paths.hook_file.exists() {
        return Ok(UninstallAction::NotInstalled);
    }
    if !is_our_hook(&paths.hook_file) {
        return Err(HookError::ForeignHook(paths.hook_file.clone()));
    }

    fs::remove_file(&paths.hook_file).map_err(|e| HookError::Io(paths.hook_file.clone(), e))?;

    if paths.backup_file.exists() {
        fs::rename(&paths.backup_file, &paths.hook_file)
            .map_err(|e| HookError::Io(paths.backup_file.clone(), e))?;
        return Ok(UninstallAction::RestoredBackup {
            from: paths.backup_file.clone(),
        });
    }

    Ok(UninstallAction::Removed)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), HookError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .map_err(|e| HookError::Io(path.to_path_buf(), e))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).map_err(|e| HookError::Io(path.to_path_buf(), e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), HookError> {
    Ok(())
}
