//! Ignore files: parsing, discovery, and ordered rule evaluation.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::IgnoreError;

use super::pattern::IgnoreRule;

/// Ignore-file locations relative to the repository root, in lookup order.
/// The first one that exists is used; the rest are not read.
pub const IGNORE_FILE_CANDIDATES: &[&str] = &[".commit-gate-ignore", ".github/commit-gate-ignore"];

/// Ordered rules from one ignore file. Later rules override earlier ones.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<IgnoreRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<IgnoreRule>) -> Self {
        Self { rules }
    }

    /// Parse ignore-file content.
    ///
    /// Blank lines and `#` comments are skipped, trailing whitespace is
    /// trimmed, and lines that fail to compile are logged and dropped.
    pub fn parse(content: &str) -> Self {
        let mut rules = Vec::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match IgnoreRule::parse(line) {
                Ok(rule) => rules.push(rule),
                Err(e) => warn!("Skipping ignore pattern on line {}: {}", idx + 1, e),
            }
        }

        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// The last rule that matches `path`, i.e. the one that decides it.
    pub fn deciding_rule(&self, path: &str) -> Option<&IgnoreRule> {
        self.rules.iter().rev().find(|rule| rule.matches(path))
    }

    /// Whether `path` is excluded from review.
    ///
    /// Every rule is evaluated in file order; each match sets the state to
    /// "ignored" unless the rule is negated.
    pub fn is_ignored(&self, path: &str) -> bool {
        let mut ignored = false;
        for rule in &self.rules {
            if rule.matches(path) {
                ignored = !rule.is_negated();
            }
        }
        ignored
    }
}

/// Find the first ignore file that exists under `root`.
pub fn find_ignore_file(root: &Path) -> Option<PathBuf> {
    IGNORE_FILE_CANDIDATES
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|path| path.is_file())
}

/// Load the rule set for a repository. A missing file yields an empty set.
pub fn load_rules(root: &Path) -> Result<(RuleSet, Option<PathBuf>), IgnoreError> {
    let Some(path) = find_ignore_file(root) else {
        debug!("No ignore file found under {}", root.display());
        return Ok((RuleSet::default(), None));
    };

    let content =
        std::fs::read_to_string(&path).map_err(|e| IgnoreError::ReadFailed(path.clone(), e))?;
    let rules = RuleSet::parse(&content);
    debug!("Loaded {} ignore rules from {}", rules.len(), path.display());

    Ok((rules, Some(path)))
}
