//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use commit_gate::config::{EnvMap, ResolvedConfig};
use git2::{Oid, Repository, Signature};
use serde_json::json;

/// Placeholder git writes into the message file before the hook runs.
pub const TEMPLATE_MESSAGE: &str = "\n# Please enter the commit message for your changes.\n";

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Get the test signature for commits.
    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write a file in the work tree, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, content).expect("Failed to write file");
    }

    /// Add a path to the index.
    pub fn stage(&self, rel: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(rel)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Write and stage in one step.
    pub fn write_staged(&self, rel: &str, content: &str) {
        self.write(rel, content);
        self.stage(rel);
    }

    /// Commit whatever is in the index. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        let sig = self.signature();
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Create `.git/COMMIT_EDITMSG` holding git's template text.
    pub fn message_file(&self) -> PathBuf {
        let path = self.repo.path().join("COMMIT_EDITMSG");
        std::fs::write(&path, TEMPLATE_MESSAGE).expect("Failed to write message file");
        path
    }
}

/// Resolve a config from literal pairs, without touching the process env.
pub fn config_from(pairs: &[(&str, &str)]) -> ResolvedConfig {
    let env: EnvMap = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ResolvedConfig::resolve(&env)
}

/// A config pointing at a mock server, with fast retries.
pub fn config_for_server(base_uri: &str, extra: &[(&str, &str)]) -> ResolvedConfig {
    let base_url = format!("{}/v1", base_uri);
    let mut pairs = vec![
        ("AI_PROVIDER", "deepseek"),
        ("DEEPSEEK_API_KEY", "sk-test"),
        ("AI_BASE_URL", base_url.as_str()),
        ("AI_RETRY_DELAY_MS", "1"),
        ("AI_TIMEOUT_MS", "5000"),
    ];
    pairs.extend_from_slice(extra);
    config_from(&pairs)
}

/// A chat-completions body whose first choice carries `content`.
pub fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "deepseek-chat",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// A completion carrying a serialized verdict object.
pub fn verdict_completion(verdict: serde_json::Value) -> serde_json::Value {
    completion(&verdict.to_string())
}
