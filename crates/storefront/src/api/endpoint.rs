//! API paths.
//!
//! Ids come from the server or from user input and are pushed as single
//! path segments, so a `/` or `?` inside an id is escaped instead of
//! changing the route.

use std::fmt;

use url::Url;

/// A path relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
}

impl Endpoint {
    /// A fixed route such as `/cart/items`. Empty segments are dropped.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Append one segment, escaped when the URL is built.
    #[must_use]
    pub fn push(mut self, segment: impl fmt::Display) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Resolve against `base`, keeping the base path.
    ///
    /// Returns `None` when `base` cannot carry a path (`mailto:` and the
    /// like); configuration only admits http(s) URLs.
    #[must_use]
    pub fn resolve(&self, base: &Url) -> Option<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(&self.segments);
        Some(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for Endpoint {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<&Self> for Endpoint {
    fn from(endpoint: &Self) -> Self {
        endpoint.clone()
    }
}
