//! Interpretation of the model's reply and the commit message it produces.

use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::ReviewError;
use crate::llm::extract_json;

/// Conventional commit types accepted in a passing verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Build,
    Ci,
    Chore,
    Revert,
}

impl std::str::FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feat" => Ok(Self::Feat),
            "fix" => Ok(Self::Fix),
            "docs" => Ok(Self::Docs),
            "style" => Ok(Self::Style),
            "refactor" => Ok(Self::Refactor),
            "perf" => Ok(Self::Perf),
            "test" => Ok(Self::Test),
            "build" => Ok(Self::Build),
            "ci" => Ok(Self::Ci),
            "chore" => Ok(Self::Chore),
            "revert" => Ok(Self::Revert),
            _ => Err(format!("unknown commit type '{}'", s)),
        }
    }
}

/// First line of a conventional commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitHeader<'a> {
    pub commit_type: CommitType,
    pub scope: Option<&'a str>,
    pub breaking: bool,
    pub description: &'a str,
}

/// Parse `type(scope)!: description`. Scope and `!` are optional.
pub fn parse_commit_header(line: &str) -> Result<CommitHeader<'_>, String> {
    let (head, description) = line
        .split_once(':')
        .ok_or_else(|| "missing ':' after the commit type".to_string())?;

    let description = description
        .strip_prefix(' ')
        .ok_or_else(|| "expected a space after ':'".to_string())?
        .trim();
    if description.is_empty() {
        return Err("empty description".to_string());
    }

    let (head, breaking) = match head.strip_suffix('!') {
        Some(h) => (h, true),
        None => (head, false),
    };

    let (type_str, scope) = match head.strip_suffix(')') {
        Some(rest) => {
            let (t, s) = rest
                .split_once('(')
                .ok_or_else(|| "unbalanced scope parentheses".to_string())?;
            if s.is_empty() || s.contains(['(', ')']) {
                return Err(format!("invalid scope '{}'", s));
            }
            (t, Some(s))
        }
        None => (head, None),
    };

    Ok(CommitHeader {
        commit_type: type_str.parse()?,
        scope,
        breaking,
        description,
    })
}

/// A structurally valid reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewVerdict {
    pub is_passed: bool,
    pub reason: String,
    pub message: String,
}

/// Result of checking a reply at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    Valid(ReviewVerdict),
    Invalid { raw: String, problem: String },
}

impl ParsedResponse {
    pub fn into_result(self) -> Result<ReviewVerdict, ReviewError> {
        match self {
            ParsedResponse::Valid(v) => Ok(v),
            ParsedResponse::Invalid { raw, problem } => {
                Err(ReviewError::MalformedResponse { raw, problem })
            }
        }
    }
}

/// Validate a raw model reply into a verdict.
///
/// `is_passed` must be a boolean. `reason` and `message` must be strings
/// when present; absent or `null` reads as empty. A passing verdict must
/// carry a conventional commit message.
pub fn parse_verdict(raw: &str) -> ParsedResponse {
    match validate(raw) {
        Ok(verdict) => ParsedResponse::Valid(verdict),
        Err(problem) => {
            debug!("Rejected review reply ({}): {}", problem, raw);
            ParsedResponse::Invalid {
                raw: raw.to_string(),
                problem,
            }
        }
    }
}

fn validate(raw: &str) -> Result<ReviewVerdict, String> {
    let json = extract_json(raw);
    let value: Value = serde_json::from_str(&json).map_err(|e| format!("not JSON: {}", e))?;
    let object = value
        .as_object()
        .ok_or_else(|| "expected a JSON object".to_string())?;

    let is_passed = match object.get("is_passed").or_else(|| object.get("isPassed")) {
        Some(Value::Bool(b)) => *b,
        Some(other) => return Err(format!("is_passed must be a boolean, got {}", other)),
        None => return Err("missing is_passed".to_string()),
    };

    let reason = string_field(object, "reason")?;
    let message = string_field(object, "message")?.trim().to_string();

    if is_passed {
        if message.is_empty() {
            return Err("passing verdict without a commit message".to_string());
        }
        let first_line = message.lines().next().unwrap_or_default();
        parse_commit_header(first_line)
            .map_err(|e| format!("message is not a conventional commit: {}", e))?;
    }

    Ok(ReviewVerdict {
        is_passed,
        reason,
        message,
    })
}

fn string_field(object: &Map<String, Value>, key: &str) -> Result<String, String> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!("{} must be a string, got {}", key, other)),
    }
}

/// Header line for appended reviewer notes.
pub const NOTES_HEADER: &str = "# AI review notes:";

/// Final text for the commit message file.
///
/// With `append_reason`, a non-blank reason is added as `#` comment lines,
/// which git strips when the commit is recorded.
pub fn compose_message(verdict: &ReviewVerdict, append_reason: bool) -> String {
    let mut text = verdict.message.trim().to_string();

    let reason = verdict.reason.trim();
    if append_reason && !reason.is_empty() {
        text.push_str("\n\n");
        text.push_str(NOTES_HEADER);
        for line in reason.lines() {
            text.push('\n');
            if line.trim().is_empty() {
                text.push('#');
            } else {
                text.push_str("# ");
                text.push_str(line.trim_end());
            }
        }
    }

    text
}

/// Replace the commit message file atomically.
pub fn write_message_file(path: &Path, text: &str) -> Result<(), ReviewError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let write_err = |e| ReviewError::WriteMessage(path.to_path_buf(), e);

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(text.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    // Keep the mode of the file being replaced; temp files start as 0600.
    if let Ok(existing) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(write_err)?;
    }
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!("Wrote {} bytes to {}", text.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(raw: &str) -> ReviewVerdict {
        match parse_verdict(raw) {
            ParsedResponse::Valid(v) => v,
            ParsedResponse::Invalid { problem, .. } => panic!("unexpected invalid: {problem}"),
        }
    }

    fn problem(raw: &str) -> String {
        match parse_verdict(raw) {
            ParsedResponse::Invalid { problem, raw: kept } => {
                assert_eq!(kept, raw);
                problem
            }
            ParsedResponse::Valid(v) => panic!("unexpected valid: {v:?}"),
        }
    }

    #[test]
    fn test_header_full_form() {
        let header = parse_commit_header("feat(auth)!: add token check").unwrap();
        assert_eq!(header.commit_type, CommitType::Feat);
        assert_eq!(header.scope, Some("auth"));
        assert!(header.breaking);
        assert_eq!(header.description, "add token check");
    }

    #[test]
    fn test_header_without_scope() {
        let header = parse_commit_header("fix: handle empty diff").unwrap();
        assert_eq!(header.commit_type, CommitType::Fix);
        assert_eq!(header.scope, None);
        assert!(!header.breaking);
    }

    #[test]
    fn test_header_revert_type() {
        assert_eq!(
            parse_commit_header("revert: undo cache change").unwrap().commit_type,
            CommitType::Revert
        );
    }

    #[test]
    fn test_header_rejections() {
        for line in [
            "add token check",
            "feature: add token check",
            "feat:add token check",
            "feat: ",
            "feat(): empty scope",
            "feat(auth: unbalanced",
            "Feat: capitalised type",
        ] {
            assert!(parse_commit_header(line).is_err(), "{line} should be rejected");
        }
    }

    #[test]
    fn test_passing_verdict() {
        let v = valid(r#"{"is_passed": true, "reason": "", "message": "feat(auth): add token check"}"#);
        assert!(v.is_passed);
        assert_eq!(v.message, "feat(auth): add token check");
        assert_eq!(v.reason, "");
    }

    #[test]
    fn test_failing_verdict_needs_no_message() {
        let v = valid(r#"{"is_passed": false, "reason": "hardcoded secret detected"}"#);
        assert!(!v.is_passed);
        assert_eq!(v.reason, "hardcoded secret detected");
        assert_eq!(v.message, "");
    }

    #[test]
    fn test_null_fields_read_as_empty() {
        let v = valid(r#"{"is_passed": false, "reason": null, "message": null}"#);
        assert_eq!(v.reason, "");
        assert_eq!(v.message, "");
    }

    #[test]
    fn test_camel_case_flag_is_accepted() {
        let v = valid(r#"{"isPassed": true, "message": "docs: fix typo"}"#);
        assert!(v.is_passed);
    }

    #[test]
    fn test_fenced_reply_is_extracted() {
        let v = valid("```json\n{\"is_passed\": true, \"message\": \"chore: bump deps\"}\n```");
        assert_eq!(v.message, "chore: bump deps");
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(problem("not json at all").contains("not JSON"));
        assert!(problem("[1, 2]").contains("object"));
        assert!(problem(r#"{"reason": "x"}"#).contains("missing is_passed"));
        assert!(problem(r#"{"is_passed": "true"}"#).contains("boolean"));
        assert!(problem(r#"{"is_passed": false, "reason": 3}"#).contains("reason"));
    }

    #[test]
    fn test_passing_verdict_requires_conventional_message() {
        assert!(problem(r#"{"is_passed": true, "message": ""}"#).contains("without a commit message"));
        assert!(problem(r#"{"is_passed": true, "message": "Added stuff"}"#).contains("conventional"));
    }

    #[test]
    fn test_multi_line_message_checks_first_line() {
        let v = valid(r#"{"is_passed": true, "message": "fix(io): retry short reads\n\nReads could stop early."}"#);
        assert!(v.message.starts_with("fix(io): retry short reads\n\n"));
    }

    #[test]
    fn test_into_result() {
        let err = parse_verdict("nope").into_result().unwrap_err();
        assert!(matches!(err, ReviewError::MalformedResponse { .. }));
    }

    #[test]
    fn test_compose_message_without_reason() {
        let v = ReviewVerdict {
            is_passed: true,
            reason: String::new(),
            message: "  feat(auth): add token check\n".to_string(),
        };
        assert_eq!(compose_message(&v, true), "feat(auth): add token check");
    }

    #[test]
    fn test_compose_message_appends_reason_as_comments() {
        let v = ReviewVerdict {
            is_passed: true,
            reason: "Looks fine.\n\nConsider a test.".to_string(),
            message: "fix: guard nil".to_string(),
        };
        assert_eq!(
            compose_message(&v, true),
            "fix: guard nil\n\n# AI review notes:\n# Looks fine.\n#\n# Consider a test."
        );
        assert_eq!(compose_message(&v, false), "fix: guard nil");
    }

    #[test]
    fn test_write_message_file_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("COMMIT_EDITMSG");
        std::fs::write(&path, "# Please enter the commit message\n").unwrap();

        write_message_file(&path, "feat: ship it").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "feat: ship it");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_message_file_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("COMMIT_EDITMSG");
        std::fs::write(&path, "\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_message_file(&path, "fix: keep mode").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fix: keep mode");
    }

    #[test]
    fn test_write_message_file_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("COMMIT_EDITMSG");
        let err = write_message_file(&path, "feat: x").unwrap_err();
        assert!(matches!(err, ReviewError::WriteMessage(..)));
    }
}
