//! Glob-like pattern matching shared by permission rules and sandbox path lists.
//!
//! Patterns without `*` or `?` are literal prefixes, so a rule like `"rm "`
//! covers `"rm -rf /tmp"`. Anything else compiles once into an anchored regex:
//!
//! - `**/` matches zero or more leading path segments
//! - `**` matches anything, separators included
//! - `*` matches anything except `/`
//! - `?` matches one character other than `/`

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Compiled regex size cap; glob expansion is linear so this is generous.
const MAX_REGEX_SIZE: usize = 1 << 20;

/// Specificity weight per wildcard class. Keeps classes strictly ordered
/// for any realistic pattern length.
const TIER_WEIGHT: i64 = 100_000;

#[derive(Debug, Clone)]
enum Matcher {
    /// No wildcards: exact or prefix match.
    Literal,
    Glob(Regex),
    /// Empty or uncompilable pattern.
    Never,
}

/// A glob pattern, compiled when constructed.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Pattern {
    source: String,
    matcher: Matcher,
    specificity: i64,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let matcher = if source.is_empty() {
            Matcher::Never
        } else if !has_wildcard(&source) {
            Matcher::Literal
        } else {
            match compile(&source) {
                Ok(re) => Matcher::Glob(re),
                Err(e) => {
                    log::warn!("pattern {source:?} failed to compile, it will never match: {e}");
                    Matcher::Never
                }
            }
        };
        let specificity = specificity(&source);
        Self {
            source,
            matcher,
            specificity,
        }
    }

    /// The pattern text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Cached [`specificity`] score.
    pub fn specificity(&self) -> i64 {
        self.specificity
    }

    pub fn matches(&self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match &self.matcher {
            Matcher::Never => false,
            Matcher::Literal => value.starts_with(self.source.as_str()),
            Matcher::Glob(re) => value == self.source || re.is_match(value),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl From<String> for Pattern {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.source
    }
}

/// One-shot match without keeping the compiled pattern around.
pub fn matches(pattern: &str, value: &str) -> bool {
    Pattern::new(pattern).matches(value)
}

/// Tertiary sort key for rule ordering: literal > single-wildcard >
/// double-wildcard, and longer beats shorter within a class.
pub fn specificity(pattern: &str) -> i64 {
    let tier = if !has_wildcard(pattern) {
        3
    } else if pattern.contains("**") {
        1
    } else {
        2
    };
    let wildcards = pattern.chars().filter(|c| matches!(c, '*' | '?')).count() as i64;
    let len = (pattern.chars().count() as i64).min(TIER_WEIGHT / 2);
    tier * TIER_WEIGHT + len * 2 - wildcards
}

fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    out.push('^');

    let chars: Vec<char> = glob.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                if chars.get(i) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 1;
                } else {
                    out.push_str(".*");
                }
            }
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            c => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                i += 1;
            }
        }
    }

    out.push('$');
    out
}

fn compile(glob: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&glob_to_regex(glob))
        .size_limit(MAX_REGEX_SIZE)
        .build()
}
