//! URL pattern matching.
//!
//! One pattern language is shared by the fetch rule engine, network request
//! queries, and script URL searches:
//!
//! - `"*"` matches any URL.
//! - `"/…/"` is a regular expression. A pattern that fails to compile
//!   matches nothing; patterns originate from agent input and must not
//!   poison an interception table with an error.
//! - Anything else is a glob: `*` matches any run of characters, `?` matches
//!   one character, all other regex metacharacters are taken literally.
//!
//! Fetch rules match the full URL (anchored `^…$`); network queries match
//! substrings (unanchored). The difference is intentional and expressed by
//! [`MatchMode`].

// ============================================================================
// Imports
// ============================================================================

use regex::Regex;

// ============================================================================
// MatchMode
// ============================================================================

/// Whether a glob pattern must cover the whole URL or any substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Anchored full match (`^…$`). Used by the fetch rule engine.
    Full,
    /// Unanchored substring match. Used by network and script queries.
    Substring,
}

// ============================================================================
// UrlPattern
// ============================================================================

/// A compiled URL matcher.
///
/// Compilation never fails; a malformed regex produces a matcher that
/// matches nothing.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    inner: Inner,
}

#[derive(Debug, Clone)]
enum Inner {
    /// `"*"`: every URL matches.
    Any,
    /// Compiled regex (from a `/…/` literal or a converted glob).
    Regex(Regex),
    /// Malformed regex: nothing matches.
    Nothing,
}

impl UrlPattern {
    /// Compiles a pattern.
    #[must_use]
    pub fn compile(pattern: &str, mode: MatchMode) -> Self {
        let inner = if pattern == "*" {
            Inner::Any
        } else if let Some(literal) = regex_literal(pattern) {
            match Regex::new(literal) {
                Ok(re) => Inner::Regex(re),
                Err(_) => Inner::Nothing,
            }
        } else {
            match Regex::new(&glob_to_regex(pattern, mode)) {
                Ok(re) => Inner::Regex(re),
                // The conversion escapes every metacharacter, so this arm is
                // only reachable through regex size limits.
                Err(_) => Inner::Nothing,
            }
        };

        Self {
            source: pattern.to_string(),
            inner,
        }
    }

    /// Returns `true` if the URL matches this pattern.
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match &self.inner {
            Inner::Any => true,
            Inner::Regex(re) => re.is_match(url),
            Inner::Nothing => false,
        }
    }

    /// Returns the original pattern text.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Extracts the body of a `/…/` regex literal, if the pattern is one.
fn regex_literal(pattern: &str) -> Option<&str> {
    if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        Some(&pattern[1..pattern.len() - 1])
    } else {
        None
    }
}

/// Converts a glob to a regex string.
fn glob_to_regex(pattern: &str, mode: MatchMode) -> String {
    let mut regex = String::with_capacity(pattern.len() + 4);
    if mode == MatchMode::Full {
        regex.push('^');
    }
    for ch in pattern.chars() {
        match ch {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '\\' => {
                regex.push('\\');
                regex.push(ch);
            }
            _ => regex.push(ch),
        }
    }
    if mode == MatchMode::Full {
        regex.push('$');
    }
    regex
}

// ============================================================================
// Tests
// ============================================================================
