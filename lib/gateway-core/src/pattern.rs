//! Path pattern compilation
//!
//! A route template is scanned left to right and turned into an anchored
//! regular expression:
//! - `{name}` matches one path segment (one or more characters other than `/`, `?`, `#`)
//! - `*` matches any run of characters, including `/`
//! - everything else is a literal
//!
//! Matching is linear in the input, so patterns are compiled once at module
//! registration and reused for every request.

use regex::Regex;
use std::borrow::Cow;
use thiserror::Error;

/// Characters that may not appear as literals in a path pattern
const RESERVED_CHARS: &str = "\\%+{}()[].;:=?@#^$\"' ";

/// Expression a `{name}` placeholder compiles to
const SEGMENT_EXPR: &str = "([^/?#]+)";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("illegal character '{0}'")]
    IllegalCharacter(char),

    #[error("illegal character '{0}' inside placeholder")]
    IllegalPlaceholderCharacter(char),

    #[error("unterminated placeholder")]
    UnterminatedPlaceholder,

    #[error("pattern did not compile: {0}")]
    Regex(String),
}

fn is_reserved(c: char) -> bool {
    RESERVED_CHARS.contains(c)
}

fn push_group(out: &mut String, group: &str) {
    out.push_str("${");
    out.push_str(group);
    out.push('}');
}

/// A compiled path pattern
#[derive(Clone, Debug)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    placeholders: Vec<String>,
}

impl PathPattern {
    /// Compile a route template such as "/users/{id}/files/*"
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let mut expr = String::with_capacity(pattern.len() * 2 + 2);
        let mut placeholders = Vec::new();
        let mut chars = pattern.chars();

        expr.push('^');
        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut terminated = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            terminated = true;
                            break;
                        }
                        if c == '/' || is_reserved(c) {
                            return Err(PatternError::IllegalPlaceholderCharacter(c));
                        }
                        name.push(c);
                    }
                    if !terminated {
                        return Err(PatternError::UnterminatedPlaceholder);
                    }
                    expr.push_str(SEGMENT_EXPR);
                    placeholders.push(name);
                }
                '*' => expr.push_str(".*"),
                c if is_reserved(c) => return Err(PatternError::IllegalCharacter(c)),
                c => {
                    let mut buf = [0u8; 4];
                    expr.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                }
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| PatternError::Regex(e.to_string()))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
            placeholders,
        })
    }

    /// The template this pattern was compiled from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of appearance
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// True if the whole of `path` matches
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Translate a redirect target into a replacement string.
    ///
    /// `{name}` and `${name}` become the capture group of the first placeholder
    /// with that name; references to unknown names stay literal. `$N` and
    /// `${N}` are positional. Any other `$` is kept as a literal dollar sign.
    pub fn replacement_for(&self, target: &str) -> String {
        let mut out = String::with_capacity(target.len() + 8);
        let mut rest = target;

        while let Some(c) = rest.chars().next() {
            match c {
                '{' => {
                    let reference = rest
                        .find('}')
                        .and_then(|close| self.group_of(&rest[1..close]).map(|group| (close, group)));
                    match reference {
                        Some((close, group)) => {
                            push_group(&mut out, &group);
                            rest = &rest[close + 1..];
                        }
                        None => {
                            out.push('{');
                            rest = &rest[1..];
                        }
                    }
                }
                '$' => {
                    let after = &rest[1..];
                    let digits = after.bytes().take_while(u8::is_ascii_digit).count();
                    if digits > 0 {
                        push_group(&mut out, &after[..digits]);
                        rest = &after[digits..];
                    } else if let Some(close) = after.strip_prefix('{').and_then(|a| a.find('}')) {
                        let name = &after[1..close + 1];
                        let group = if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
                            Some(name.to_string())
                        } else {
                            self.group_of(name)
                        };
                        match group {
                            Some(group) => push_group(&mut out, &group),
                            None => {
                                out.push_str("$$");
                                out.push_str(&after[..close + 2]);
                            }
                        }
                        rest = &after[close + 2..];
                    } else {
                        out.push_str("$$");
                        rest = after;
                    }
                }
                c => {
                    out.push(c);
                    rest = &rest[c.len_utf8()..];
                }
            }
        }
        out
    }

    fn group_of(&self, name: &str) -> Option<String> {
        self.placeholders
            .iter()
            .position(|p| p == name)
            .map(|index| (index + 1).to_string())
    }

    /// Substitute `path` with a replacement produced by [`Self::replacement_for`].
    /// A path that does not match is returned unchanged.
    pub fn rewrite<'a>(&self, path: &'a str, replacement: &str) -> Cow<'a, str> {
        self.regex.replace(path, replacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_pattern_is_exact() {
        let pattern = PathPattern::compile("/foo/bar").unwrap();
        assert!(pattern.is_match("/foo/bar"));
        assert!(!pattern.is_match("/foo/bar/"));
        assert!(!pattern.is_match("/foo/ba"));
        assert!(!pattern.is_match("x/foo/bar"));
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        let pattern = PathPattern::compile("/a|b-c_d~e!").unwrap();
        assert!(pattern.is_match("/a|b-c_d~e!"));
        assert!(!pattern.is_match("/a"));
        assert!(!pattern.is_match("b-c_d~e!"));
    }

    #[test]
    fn test_placeholder_matches_one_segment() {
        let pattern = PathPattern::compile("/foo/{id}").unwrap();
        assert!(pattern.is_match("/foo/123"));
        assert!(pattern.is_match("/foo/abc"));
        assert!(!pattern.is_match("/foo/123/bar"));
        assert!(!pattern.is_match("/foo/"));
        assert_eq!(pattern.placeholders(), ["id".to_string()]);
    }

    #[test]
    fn test_wildcard_spans_segments() {
        let pattern = PathPattern::compile("/foo/*").unwrap();
        assert!(pattern.is_match("/foo/"));
        assert!(pattern.is_match("/foo/a/b/c"));
        assert!(!pattern.is_match("/foo"));
        assert!(!pattern.is_match("/bar/a"));
    }

    #[test]
    fn test_illegal_literal() {
        for c in RESERVED_CHARS.chars().filter(|c| *c != '{') {
            let source = format!("/foo{}bar", c);
            let err = PathPattern::compile(&source).unwrap_err();
            assert_eq!(err, PatternError::IllegalCharacter(c), "pattern {:?}", source);
            assert!(err.to_string().contains("illegal character"));
        }
    }

    #[test]
    fn test_slash_in_placeholder() {
        let err = PathPattern::compile("/foo/{a/b}").unwrap_err();
        assert_eq!(err, PatternError::IllegalPlaceholderCharacter('/'));
    }

    #[test]
    fn test_reserved_in_placeholder() {
        let err = PathPattern::compile("/foo/{a.b}").unwrap_err();
        assert_eq!(err, PatternError::IllegalPlaceholderCharacter('.'));

        let err = PathPattern::compile("/foo/{a{b}").unwrap_err();
        assert_eq!(err, PatternError::IllegalPlaceholderCharacter('{'));
    }

    #[test]
    fn test_unterminated_placeholder() {
        let err = PathPattern::compile("/foo/{id").unwrap_err();
        assert_eq!(err, PatternError::UnterminatedPlaceholder);
        assert_eq!(err.to_string(), "unterminated placeholder");

        assert_eq!(
            PathPattern::compile("{").unwrap_err(),
            PatternError::UnterminatedPlaceholder
        );
    }

    #[test]
    fn test_replacement_for_placeholders() {
        let pattern = PathPattern::compile("/old/{tenant}/{id}").unwrap();
        assert_eq!(pattern.replacement_for("/new/{id}/{tenant}"), "/new/${2}/${1}");
        assert_eq!(pattern.replacement_for("/new/{other}"), "/new/{other}");
        assert_eq!(pattern.replacement_for("/new/$1"), "/new/${1}");
        assert_eq!(pattern.replacement_for("/new/{id"), "/new/{id");
    }

    #[test]
    fn test_replacement_for_dollar_references() {
        let pattern = PathPattern::compile("/old/{tenant}/{id}").unwrap();
        assert_eq!(pattern.replacement_for("/new/$2abc"), "/new/${2}abc");
        assert_eq!(pattern.replacement_for("/new/${1}x"), "/new/${1}x");
        assert_eq!(pattern.replacement_for("/new/${id}"), "/new/${2}");
        assert_eq!(pattern.replacement_for("/new/${other}"), "/new/$${other}");
        assert_eq!(pattern.replacement_for("/cost/$/x$"), "/cost/$$/x$$");
        assert_eq!(pattern.replacement_for("/new/{a$1}"), "/new/{a${1}}");
    }

    #[test]
    fn test_rewrite_positional_followed_by_text() {
        let pattern = PathPattern::compile("/old/{id}").unwrap();
        let replacement = pattern.replacement_for("/new/$1abc");
        assert_eq!(pattern.rewrite("/old/42", &replacement), "/new/42abc");

        let replacement = pattern.replacement_for("/price/$/{id}");
        assert_eq!(pattern.rewrite("/old/42", &replacement), "/price/$/42");

        let replacement = pattern.replacement_for("/new/${other}");
        assert_eq!(pattern.rewrite("/old/42", &replacement), "/new/${other}");
    }

    #[test]
    fn test_rewrite() {
        let pattern = PathPattern::compile("/old/{id}").unwrap();
        let replacement = pattern.replacement_for("/new/{id}");
        assert_eq!(pattern.rewrite("/old/42", &replacement), "/new/42");
        assert_eq!(pattern.rewrite("/other/42", &replacement), "/other/42");
    }
}
