//! Fixed reviewer instruction and the per-run user message.

/// System instruction sent with every review request.
pub const SYSTEM_INSTRUCTION: &str = r#"You are a strict senior code reviewer acting as a git pre-commit gate.

You receive the staged changes of a single commit as a unified diff. Review them for:
- obvious bugs, broken logic, or code that cannot work as written
- leaked secrets: API keys, passwords, tokens, private keys
- leftover debugging code, commented-out blocks, or unresolved merge markers
- changes that are clearly incomplete

Minor style preferences are NOT a reason to reject.

Respond with ONLY a JSON object with exactly these fields:
{
  "is_passed": true or false,
  "reason": "short explanation; empty string when there is nothing to report",
  "message": "commit message when is_passed is true, otherwise empty string"
}

When is_passed is true, "message" MUST follow Conventional Commits:
  <type>(<optional scope>): <description>
where <type> is one of: feat, fix, docs, style, refactor, perf, test, build, ci, chore, revert.
Keep the first line under 72 characters, in the imperative mood, without a trailing period.
You may add a body after a blank line when the change needs explanation.

Do not wrap the JSON in markdown. Do not add any text outside the JSON object."#;

/// Build the user message for one diff.
///
/// `truncated` adds a note so the model does not flag the cut-off tail as
/// an incomplete change.
pub fn build_user_message(diff: &str, truncated: bool) -> String {
    let mut message = String::with_capacity(diff.len() + 128);
    message.push_str("Review the following staged changes.\n");
    if truncated {
        message.push_str(
            "The diff was truncated to fit the size limit; do not judge the missing tail.\n",
        );
    }
    message.push_str("\n```diff\n");
    message.push_str(diff);
    if !diff.ends_with('\n') {
        message.push('\n');
    }
    message.push_str("```\n");
    message
}
