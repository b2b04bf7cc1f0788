//! Ignore rules for excluding files from review.

pub mod pattern;
pub mod rules;

pub use pattern::{IgnoreRule, PathMatcher, Token, tokenize, translate};
pub use rules::{IGNORE_FILE_CANDIDATES, RuleSet, find_ignore_file, load_rules};
