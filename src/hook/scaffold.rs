//! Example configuration files written by `commit-gate init`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::REPO_ENV_FILE;
use crate::error::HookError;
use crate::ignore::IGNORE_FILE_CANDIDATES;

pub const EXAMPLE_ENV: &str = "\
# commit-gate settings for this repository.
# Values here override the user config file; the process environment
# overrides both. Keep API keys out of version control.

# openai | deepseek | moonshot | qwen | zhipu | openrouter | ollama
AI_PROVIDER=openai
# OPENAI_API_KEY=sk-...
# AI_API_KEY=
# AI_BASE_URL=
# AI_MODEL=
# AI_PROXY=http://127.0.0.1:7890

# AI_MAX_DIFF_SIZE=20000
# AI_TIMEOUT_MS=60000
# AI_MAX_RETRIES=3
# AI_RETRY_DELAY_MS=1000
# AI_RATE_LIMIT_MULTIPLIER=2

# AI_BUILD_COMMAND=cargo check
# AI_SKIP_BUILD=false
# AI_APPEND_REASON=true
# AI_VERBOSE=false
";

pub const EXAMPLE_IGNORE: &str = "\
# Files excluded from AI review. Same syntax as .gitignore:
#   *      anything except '/'
#   **     anything, across directories
#   ?      one character except '/'
#   /x     anchored to the repository root
#   x/     directories only
#   !x     re-include a previously excluded path (last match wins)

# Lock files
*.lock
package-lock.json
pnpm-lock.yaml

# Build output
dist/
build/
target/

# Generated and minified code
*.min.js
*.min.css
**/generated/**
";

/// Write the example env and ignore files into `root`.
///
/// Existing files are left alone unless `force` is set.
pub fn init(root: &Path, force: bool) -> Result<Vec<PathBuf>, HookError> {
    let targets = [
        (root.join(REPO_ENV_FILE), EXAMPLE_ENV),
        (root.join(IGNORE_FILE_CANDIDATES[0]), EXAMPLE_IGNORE),
    ];

    if !force
        && let Some((path, _)) = targets.iter().find(|(p, _)| p.exists())
    {
        return Err(HookError::FileExists(path.clone()));
    }

    let mut written = Vec::with_capacity(targets.len());
    for (path, content) in targets {
        fs::write(&path, content).map_err(|e| HookError::Io(path.clone(), e))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ResolvedConfig, read_env_file};
    use crate::ignore::RuleSet;

    #[test]
    fn test_init_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let written = init(dir.path(), false).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join(".commit-gate.env").is_file());
        assert!(dir.path().join(".commit-gate-ignore").is_file());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".commit-gate-ignore"), "mine\n").unwrap();

        let err = init(dir.path(), false).unwrap_err();
        assert!(matches!(err, HookError::FileExists(_)));
        assert!(!dir.path().join(".commit-gate.env").exists());

        init(dir.path(), true).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join(".commit-gate-ignore")).unwrap(),
            EXAMPLE_IGNORE
        );
    }

    #[test]
    fn test_example_env_resolves_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path(), false).unwrap();
        let env = read_env_file(&dir.path().join(REPO_ENV_FILE)).unwrap();
        let config = ResolvedConfig::resolve(&env);
        assert_eq!(config.provider, "openai");
        assert!(!config.has_credential());
    }

    #[test]
    fn test_example_ignore_rules_compile() {
        let rules = RuleSet::parse(EXAMPLE_IGNORE);
        assert_eq!(rules.len(), 9);
        assert!(rules.is_ignored("Cargo.lock"));
        assert!(rules.is_ignored("web/dist/app.js"));
        assert!(rules.is_ignored("src/api/generated/client.rs"));
        assert!(!rules.is_ignored("src/main.rs"));
    }
}
