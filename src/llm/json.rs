//! Pull a JSON object out of a model reply.
//!
//! Even with `response_format: json_object`, several OpenAI-compatible
//! providers wrap the object in a markdown fence or add a sentence around
//! it. The verdict parser only ever sees the text returned from here.

/// Extract the review object from a reply that may be wrapped in markdown.
///
/// Tries, in order:
/// 1. a ` ```json ... ``` ` fenced block
/// 2. a bare ` ``` ... ``` ` fenced block whose content starts with `{`
/// 3. the first `{` at which a complete JSON object can be read
/// 4. the trimmed input, unchanged
pub fn extract_json(reply: &str) -> String {
    let trimmed = reply.trim();

    if let Some(start) = trimmed.find("```json")
        && let Some(end) = trimmed[start + 7..].find("```")
    {
        return trimmed[start + 7..start + 7 + end].trim().to_string();
    }

    if let Some(start) = trimmed.find("```")
        && let Some(end) = trimmed[start + 3..].find("```")
    {
        let inner = trimmed[start + 3..start + 3 + end].trim();
        if inner.starts_with('{') {
            return inner.to_string();
        }
    }

    if let Some(object) = first_json_object(trimmed) {
        return object;
    }

    trimmed.to_string()
}

/// Scan each `{` for a parseable object.
///
/// A streaming deserializer reads one value and ignores what follows, so
/// trailing prose does not defeat it; the brace scan is the fallback for
/// inputs serde rejects outright.
fn first_json_object(text: &str) -> Option<String> {
    for (start, _) in text.match_indices('{') {
        let candidate = &text[start..];

        let mut stream =
            serde_json::Deserializer::from_str(candidate).into_iter::<serde_json::Value>();
        if let Some(Ok(value)) = stream.next()
            && value.is_object()
        {
            let end = stream.byte_offset();
            return Some(candidate[..end].to_string());
        }

        if let Some(slice) = balanced_braces(candidate)
            && serde_json::from_str::<serde_json::Value>(slice).is_ok()
        {
            return Some(slice.to_string());
        }
    }

    None
}

/// Prefix of `text` up to the brace closing the first `{`.
///
/// String literals, including escaped quotes, are skipped so braces inside
/// a commit message do not count.
fn balanced_braces(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}
