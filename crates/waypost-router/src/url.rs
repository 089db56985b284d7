//! Raw URL parsing.
//!
//! The dispatcher turns every raw location string into a [`ParsedUrl`]
//! before matching. [`parse_url`] is the default parser; hosts with their own
//! URL conventions can inject a different [`UrlParser`].

use std::collections::HashMap;
use std::sync::Arc;

/// A parsing function from a raw location string to path and query.
pub type UrlParser = Arc<dyn Fn(&str) -> ParsedUrl + Send + Sync>;

/// The structured form of a raw location string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUrl {
    /// The path, never empty (`"/"` for an empty path).
    pub path: String,
    /// Decoded query parameters. When a key repeats, the last value wins.
    pub query: HashMap<String, String>,
}

/// Parses a raw location such as `/list/shoes?sort=price#top`.
///
/// The fragment is dropped. The path is kept verbatim so that route
/// patterns see exactly what the host reported; query keys and values are
/// percent-decoded, with `+` read as a space.
///
/// # Examples
///
/// ```
/// use waypost_router::url::parse_url;
///
/// let url = parse_url("/search?q=red+shoes&page=2");
/// assert_eq!(url.path, "/search");
/// assert_eq!(url.query["q"], "red shoes");
/// assert_eq!(url.query["page"], "2");
/// ```
pub fn parse_url(raw: &str) -> ParsedUrl {
    let without_fragment = raw.split_once('#').map_or(raw, |(before, _)| before);
    let (path, query_string) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));

    let path = if path.is_empty() { "/" } else { path };

    ParsedUrl {
        path: path.to_string(),
        query: parse_query(query_string),
    }
}

/// Returns the default parser as an injectable [`UrlParser`].
pub fn default_parser() -> UrlParser {
    Arc::new(parse_url)
}

fn parse_query(query_string: &str) -> HashMap<String, String> {
    let mut query = HashMap::new();

    for pair in query_string.split('&') {
        if pair.is_empty() {
            continue;
        }

        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        query.insert(decode_component(key), decode_component(value));
    }

    query
}

/// Turns one raw query key or value into text. Paths never go through here.
fn decode_component(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| if c == '+' { ' ' } else { c })
        .collect();
    percent_encoding::percent_decode(spaced.as_bytes())
        .decode_utf8_lossy()
        .into_owned()
}
