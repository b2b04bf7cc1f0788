//! Ignore-pattern compiler.
//!
//! A pattern is tokenized into literal / `*` / `**` / `?` tokens and then
//! translated into an anchored regular expression over repository-relative
//! paths. Translation is deterministic and independent of the regex engine,
//! so [`translate`] can be tested on its own.

use regex_lite::Regex;

use crate::error::PatternError;

/// One lexical unit of an ignore pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text, matched byte for byte.
    Literal(String),
    /// `*`: any run of characters within one path segment.
    Star,
    /// `**`: any run of characters, crossing `/`.
    DoubleStar,
    /// `?`: exactly one character other than `/`.
    Question,
}

/// Split a pattern body into tokens.
///
/// Runs of two or more `*` collapse into a single [`Token::DoubleStar`].
/// A backslash makes the following character literal.
pub fn tokenize(body: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    literal.push(escaped);
                }
            }
            '*' | '?' => {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                if ch == '?' {
                    tokens.push(Token::Question);
                } else if chars.peek() == Some(&'*') {
                    while chars.peek() == Some(&'*') {
                        chars.next();
                    }
                    tokens.push(Token::DoubleStar);
                } else {
                    tokens.push(Token::Star);
                }
            }
            _ => literal.push(ch),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }

    tokens
}

/// Translate a pattern body (negation already stripped) into a regex source.
///
/// - a leading `/` anchors at the start of the path, otherwise the match may
///   start at the beginning or right after any `/`;
/// - a trailing `/` leaves the match ending on that separator (directory
///   match), otherwise the match must end at end-of-string or before a `/`.
pub fn translate(body: &str) -> Result<String, PatternError> {
    let anchored = body.starts_with('/');
    let dir_only = body.ends_with('/');
    let inner = body.strip_prefix('/').unwrap_or(body);

    if inner.trim_matches('/').is_empty() {
        return Err(PatternError::Empty);
    }

    let mut out = String::from(if anchored { "^" } else { "(?:^|/)" });
    let mut tokens = tokenize(inner).into_iter().peekable();

    while let Some(token) = tokens.next() {
        match token {
            Token::Literal(text) => out.push_str(&regex_lite::escape(&text)),
            Token::Star => out.push_str("[^/]*"),
            Token::Question => out.push_str("[^/]"),
            Token::DoubleStar => {
                // `**/` may also match zero directories.
                let next_is_dir = matches!(
                    tokens.peek(),
                    Some(Token::Literal(text)) if text.starts_with('/')
                );
                if next_is_dir {
                    out.push_str("(?:.*/)?");
                    if let Some(Token::Literal(text)) = tokens.next() {
                        out.push_str(&regex_lite::escape(&text[1..]));
                    }
                } else {
                    out.push_str(".*");
                }
            }
        }
    }

    if !dir_only {
        out.push_str("(?:/|$)");
    }

    Ok(out)
}

/// A compiled path predicate.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    regex: Regex,
}

impl PathMatcher {
    /// Compile a pattern body (without a leading `!`).
    pub fn compile(body: &str) -> Result<Self, PatternError> {
        let source = translate(body)?;
        let regex = Regex::new(&source).map_err(|e| PatternError::InvalidExpression {
            pattern: body.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    /// Whether the repository-relative `path` matches. Case-sensitive.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// The generated expression, mostly useful for diagnostics.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// One line of an ignore file, compiled.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    source: String,
    negated: bool,
    matcher: PathMatcher,
}

impl IgnoreRule {
    /// Parse a pattern line. A single leading `!` negates the rule.
    ///
    /// `\!` and `\#` at the start of the line stand for a literal `!` / `#`.
    pub fn parse(line: &str) -> Result<Self, PatternError> {
        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };

        let body = if body.starts_with("\\!") || body.starts_with("\\#") {
            &body[1..]
        } else {
            body
        };

        if body.is_empty() {
            return Err(PatternError::Empty);
        }

        Ok(Self {
            source: line.to_string(),
            negated,
            matcher: PathMatcher::compile(body)?,
        })
    }

    /// The pattern text as written in the ignore file.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }
}
