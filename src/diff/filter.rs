//! Per-file filtering of unified diffs against ignore rules.

use crate::ignore::RuleSet;

/// Marker that opens each file block in `git diff` output.
const FILE_HEADER: &str = "diff --git ";

/// One file's block of a unified diff.
///
/// `lines` keep their terminators, so concatenating every segment of a
/// diff reproduces it byte for byte. Text before the first file header
/// forms a segment without a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSegment<'a> {
    pub path: Option<String>,
    pub lines: Vec<&'a str>,
}

impl DiffSegment<'_> {
    pub fn text(&self) -> String {
        self.lines.concat()
    }
}

/// Result of filtering a diff, with the paths on each side of the cut.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredDiff {
    pub text: String,
    pub kept: Vec<String>,
    pub dropped: Vec<String>,
}

/// Extract the new-side path from a `diff --git a/<old> b/<new>` line.
pub fn header_path(line: &str) -> Option<String> {
    let rest = line.strip_prefix(FILE_HEADER)?;
    let rest = rest.trim_end_matches(['\n', '\r']);

    if rest.ends_with('"') {
        return quoted_new_path(rest);
    }

    // Unchanged path: "a/P b/P". Checking both halves keeps paths that
    // themselves contain " b/" intact.
    if rest.len() >= 5 && (rest.len() - 5) % 2 == 0 {
        let p = (rest.len() - 5) / 2;
        if rest.is_char_boundary(2 + p)
            && rest.is_char_boundary(rest.len() - p)
            && rest.starts_with("a/")
            && rest[2 + p..].starts_with(" b/")
            && rest[2..2 + p] == rest[rest.len() - p..]
        {
            return Some(rest[rest.len() - p..].to_string());
        }
    }

    if let Some(idx) = rest.rfind(" b/") {
        return Some(rest[idx + 3..].to_string());
    }

    rest.rsplit(' ').next().map(str::to_string)
}

/// Handle git's C-quoted form: `"a/with\ttab" "b/with\ttab"`.
fn quoted_new_path(rest: &str) -> Option<String> {
    let start = rest[..rest.len() - 1].rfind('"')?;
    let quoted = &rest[start + 1..rest.len() - 1];
    let unquoted = unescape_c_style(quoted);
    Some(
        unquoted
            .strip_prefix("b/")
            .map(str::to_string)
            .unwrap_or(unquoted),
    )
}

fn unescape_c_style(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Split a diff into file segments without losing any bytes.
pub fn split_segments(diff: &str) -> Vec<DiffSegment<'_>> {
    let mut segments = Vec::new();
    let mut current = DiffSegment {
        path: None,
        lines: Vec::new(),
    };

    for line in diff.split_inclusive('\n') {
        if let Some(path) = header_path(line) {
            if current.path.is_some() || !current.lines.is_empty() {
                segments.push(current);
            }
            current = DiffSegment {
                path: Some(path),
                lines: Vec::new(),
            };
        }
        current.lines.push(line);
    }

    if current.path.is_some() || !current.lines.is_empty() {
        segments.push(current);
    }

    segments
}

/// Drop the file segments whose path the rules ignore.
///
/// With no rules the input is returned unchanged. Filtering is idempotent.
pub fn partition_diff(diff: &str, rules: &RuleSet) -> FilteredDiff {
    if rules.is_empty() {
        return FilteredDiff {
            text: diff.to_string(),
            kept: split_segments(diff)
                .into_iter()
                .filter_map(|s| s.path)
                .collect(),
            dropped: Vec::new(),
        };
    }

    let mut result = FilteredDiff {
        text: String::with_capacity(diff.len()),
        ..Default::default()
    };

    for segment in split_segments(diff) {
        match segment.path {
            Some(ref path) if rules.is_ignored(path) => {
                result.dropped.push(path.clone());
            }
            Some(ref path) => {
                result.kept.push(path.clone());
                result.text.push_str(&segment.text());
            }
            None => result.text.push_str(&segment.text()),
        }
    }

    result
}

/// Filter a diff down to the segments that should be reviewed.
pub fn filter_diff(diff: &str, rules: &RuleSet) -> String {
    if rules.is_empty() {
        return diff.to_string();
    }
    partition_diff(diff, rules).text
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "diff --git a/src/lib.rs b/src/lib.rs\n\
index 1111111..2222222 100644\n\
--- a/src/lib.rs\n\
+++ b/src/lib.rs\n\
@@ -1,2 +1,3 @@\n\
 pub mod a;\n\
+pub mod b;\n\
diff --git a/dist/bundle.js b/dist/bundle.js\n\
new file mode 100644\n\
--- /dev/null\n\
+++ b/dist/bundle.js\n\
@@ -0,0 +1 @@\n\
+console.log(1)\n\
diff --git a/README.md b/README.md\n\
--- a/README.md\n\
+++ b/README.md\n\
@@ -1 +1 @@\n\
-old\n\
+new\n";

    #[test]
    fn test_header_path_simple() {
        assert_eq!(
            header_path("diff --git a/src/lib.rs b/src/lib.rs\n").as_deref(),
            Some("src/lib.rs")
        );
    }

    #[test]
    fn test_header_path_rename_uses_new_side() {
        assert_eq!(
            header_path("diff --git a/old/name.rs b/new/name.rs").as_deref(),
            Some("new/name.rs")
        );
    }

    #[test]
    fn test_header_path_with_spaces_and_b_slash() {
        assert_eq!(
            header_path("diff --git a/x b/y.txt b/x b/y.txt\r\n").as_deref(),
            Some("x b/y.txt")
        );
    }

    #[test]
    fn test_header_path_quoted() {
        assert_eq!(
            header_path("diff --git \"a/tab\\there.txt\" \"b/tab\\there.txt\"\n").as_deref(),
            Some("tab\there.txt")
        );
    }

    #[test]
    fn test_header_path_non_header_line() {
        assert!(header_path("+diff --git a/x b/x").is_none());
        assert!(header_path("index 123..456").is_none());
    }

    #[test]
    fn test_split_segments_is_lossless() {
        let segments = split_segments(SAMPLE);
        assert_eq!(segments.len(), 3);
        let rebuilt: String = segments.iter().map(|s| s.text()).collect();
        assert_eq!(rebuilt, SAMPLE);
    }

    #[test]
    fn test_split_segments_keeps_preamble() {
        let diff = format!("preamble line\n{SAMPLE}");
        let segments = split_segments(&diff);
        assert_eq!(segments.len(), 4);
        assert!(segments[0].path.is_none());
        assert_eq!(segments[0].lines, vec!["preamble line\n"]);
    }

    #[test]
    fn test_filter_drops_ignored_segments() {
        let rules = RuleSet::parse("dist/\n");
        let filtered = filter_diff(SAMPLE, &rules);
        assert!(!filtered.contains("bundle.js"));
        assert!(filtered.contains("src/lib.rs"));
        assert!(filtered.contains("README.md"));
        assert!(filtered.starts_with("diff --git a/src/lib.rs"));
    }

    #[test]
    fn test_filter_applies_negation() {
        let rules = RuleSet::parse("*.md\n*.js\n!dist/bundle.js\n");
        let result = partition_diff(SAMPLE, &rules);
        assert_eq!(result.dropped, vec!["README.md".to_string()]);
        assert_eq!(
            result.kept,
            vec!["src/lib.rs".to_string(), "dist/bundle.js".to_string()]
        );
    }

    #[test]
    fn test_filter_everything_yields_empty() {
        let rules = RuleSet::parse("*\n");
        assert_eq!(filter_diff(SAMPLE, &rules), "");
    }

    #[test]
    fn test_filter_empty_rules_is_identity() {
        let weird = "no trailing newline\r\ndiff --git a/a b/a\n+x";
        assert_eq!(filter_diff(weird, &RuleSet::default()), weird);
        assert_eq!(filter_diff(SAMPLE, &RuleSet::default()), SAMPLE);
    }

    #[test]
    fn test_filter_is_idempotent() {
        for patterns in ["dist/\n", "*.md\n!README.md\n", "src/**\n", "*\n!*.rs\n"] {
            let rules = RuleSet::parse(patterns);
            let once = filter_diff(SAMPLE, &rules);
            let twice = filter_diff(&once, &rules);
            assert_eq!(once, twice, "not idempotent for {patterns:?}");
        }
    }

    #[test]
    fn test_content_lines_resembling_headers_are_not_split() {
        let diff = "diff --git a/notes.txt b/notes.txt\n+ diff --git a/x b/x\n";
        let segments = split_segments(diff);
        assert_eq!(segments.len(), 1);
    }
}
