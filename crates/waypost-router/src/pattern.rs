//! Route pattern compilation and matching.
//!
//! A route rule is either a string pattern such as `/list/:category` or a
//! pre-built [`Matcher`]. [`compile`] turns both into a [`CompiledRule`]:
//! a matcher plus the ordered parameter names its capture groups map to.
//!
//! In a string pattern, every `/:name` segment (name made of letters, digits,
//! `_` and `-`, followed by `/` or the end of the pattern) becomes a capture
//! group matching one or more characters that are neither `/` nor
//! whitespace. The rest of the pattern is regular-expression syntax, so
//! `/(list|grid)/:id` is a valid rule. The compiled expression is anchored
//! at both ends and case-insensitive.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use waypost_core::{WaypostError, WaypostResult};

/// Finds `/:name` parameter segments in a route pattern.
static PARAM_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/:([a-zA-Z0-9_-]+)").expect("parameter segment regex is valid")
});

/// What a `/:name` segment compiles to.
const PARAM_CAPTURE: &str = r"/([^/\s]+)";

/// Something that can test a path and report its captures.
///
/// `test` returns `None` when the path does not match. On a match it returns
/// the captures of groups 1..n in order; a group that did not participate in
/// the match is `None`. The whole-match group 0 is never included.
pub trait Matcher: fmt::Debug + Send + Sync {
    /// Tests `path`, returning the ordered captures on a match.
    fn test(&self, path: &str) -> Option<Vec<Option<String>>>;
}

impl Matcher for Regex {
    fn test(&self, path: &str) -> Option<Vec<Option<String>>> {
        let captures = self.captures(path)?;
        Some(
            captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect(),
        )
    }
}

/// A route rule as supplied in a [`RouteConfig`](crate::table::RouteConfig).
#[derive(Clone)]
pub enum Rule {
    /// A string pattern with optional `/:name` segments.
    Pattern(String),
    /// A pre-built matcher, used as-is. Its captures are exposed under
    /// their 1-based positions.
    Matcher(Arc<dyn Matcher>),
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(p) => f.debug_tuple("Pattern").field(p).finish(),
            Self::Matcher(m) => f.debug_tuple("Matcher").field(m).finish(),
        }
    }
}

impl From<&str> for Rule {
    fn from(pattern: &str) -> Self {
        Self::Pattern(pattern.to_string())
    }
}

impl From<String> for Rule {
    fn from(pattern: String) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<Regex> for Rule {
    fn from(regex: Regex) -> Self {
        Self::Matcher(Arc::new(regex))
    }
}

impl From<Arc<dyn Matcher>> for Rule {
    fn from(matcher: Arc<dyn Matcher>) -> Self {
        Self::Matcher(matcher)
    }
}

/// A rule ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// The matcher to test paths against.
    pub matcher: Arc<dyn Matcher>,
    /// Parameter names by capture index. Index 0 is always empty; an empty
    /// name means the capture is exposed under its index.
    pub param_names: Vec<String>,
}

/// Compiles a rule into a matcher and its parameter names.
///
/// # Examples
///
/// ```
/// use waypost_router::pattern::{compile, Rule};
///
/// let compiled = compile(&Rule::from("/user/:id")).unwrap();
/// assert_eq!(compiled.param_names, vec!["", "id"]);
/// assert_eq!(
///     compiled.matcher.test("/USER/42"),
///     Some(vec![Some("42".to_string())])
/// );
/// ```
///
/// # Errors
///
/// Returns [`WaypostError::ConfigurationError`] if a string pattern does not
/// form a valid regular expression.
pub fn compile(rule: &Rule) -> WaypostResult<CompiledRule> {
    match rule {
        Rule::Pattern(pattern) => compile_pattern(pattern),
        Rule::Matcher(matcher) => Ok(CompiledRule {
            matcher: Arc::clone(matcher),
            param_names: vec![String::new()],
        }),
    }
}

fn compile_pattern(pattern: &str) -> WaypostResult<CompiledRule> {
    let mut param_names = vec![String::new()];
    let mut regex_text = String::from("^");
    let mut copied_up_to = 0;

    for captures in PARAM_SEGMENT.captures_iter(pattern) {
        let (Some(segment), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };

        // Only whole segments count: `/:id.json` stays literal.
        let rest = &pattern[segment.end()..];
        if !(rest.is_empty() || rest.starts_with('/')) {
            continue;
        }

        regex_text.push_str(&pattern[copied_up_to..segment.start()]);
        regex_text.push_str(PARAM_CAPTURE);
        param_names.push(name.as_str().to_string());
        copied_up_to = segment.end();
    }

    regex_text.push_str(&pattern[copied_up_to..]);
    regex_text.push('$');

    let regex = RegexBuilder::new(&regex_text)
        .case_insensitive(true)
        .build()
        .map_err(|e| {
            WaypostError::ConfigurationError(format!("Invalid route pattern '{pattern}': {e}"))
        })?;

    Ok(CompiledRule {
        matcher: Arc::new(regex),
        param_names,
    })
}
