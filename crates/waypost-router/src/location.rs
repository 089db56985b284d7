//! Locations and redirect notifications.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::url::ParsedUrl;

/// A redirect notification emitted by a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// The raw location the host moved to.
    pub url: String,
    /// The raw location the host moved away from, if any.
    pub referrer: Option<String>,
}

impl Redirect {
    /// Creates a redirect with no referrer.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            referrer: None,
        }
    }

    /// Sets the referrer.
    #[must_use]
    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }
}

/// The location handed to listeners, route handlers, and views.
///
/// `query` holds the URL's query parameters with the matched route's path
/// parameters merged in: named parameters under their names, unnamed
/// captures under their 1-based position (`"1"`, `"2"`, ...). A path
/// parameter overwrites a query parameter of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// The path portion of the URL.
    pub path: String,
    /// Query and path parameters.
    pub query: HashMap<String, String>,
    /// The previous raw location, if the locator reported one.
    pub referrer: Option<String>,
}

impl Location {
    /// Creates a location with an empty query and no referrer.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Returns a query or path parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

impl From<ParsedUrl> for Location {
    fn from(url: ParsedUrl) -> Self {
        Self {
            path: url.path,
            query: url.query,
            referrer: None,
        }
    }
}
