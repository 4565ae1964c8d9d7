//! URL construction for provider endpoints.

use crate::error::{Error, ErrorKind, Result};

/// Builds an endpoint URL from a base, path pieces and query parameters.
///
/// Path pieces are trusted (they may contain `/`); values that come from
/// callers, such as record ids, go through [`UrlBuilder::with_segment`] so
/// they cannot escape their path segment.
///
/// ```rust
/// use connectors_common::UrlBuilder;
///
/// let url = UrlBuilder::new("https://acme.my.salesforce.com/", ["services/data/v59.0", "jobs/ingest"])
///     .unwrap()
///     .with_segment("750/../x")
///     .with_query_param("locator", "abc")
///     .build();
/// assert_eq!(
///     url,
///     "https://acme.my.salesforce.com/services/data/v59.0/jobs/ingest/750%2F..%2Fx?locator=abc"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: url::Url,
    path: Vec<String>,
    query: Vec<(String, String)>,
}

impl UrlBuilder {
    /// Start from `base` and append each of `paths`.
    pub fn new<I, S>(base: &str, paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let base = url::Url::parse(base.trim())?;
        if base.cannot_be_a_base() {
            return Err(Error::new(ErrorKind::InvalidUrl(format!(
                "'{}' cannot be used as a base URL",
                base
            ))));
        }

        let builder = Self {
            base,
            path: Vec::new(),
            query: Vec::new(),
        };
        Ok(paths
            .into_iter()
            .fold(builder, |b, p| b.with_path(p.as_ref())))
    }

    /// Append a trusted path, which may span several segments.
    pub fn with_path(mut self, path: &str) -> Self {
        self.path.extend(
            path.split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        self
    }

    /// Append a single segment, percent-encoding everything that is not unreserved.
    pub fn with_segment(mut self, value: &str) -> Self {
        self.path.push(urlencoding::encode(value).into_owned());
        self
    }

    /// Append a query parameter. Repeated keys are kept in order.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Render the URL.
    pub fn build(&self) -> String {
        let mut url = self.base.clone();

        let mut path = url.path().trim_end_matches('/').to_string();
        for segment in &self.path {
            path.push('/');
            path.push_str(segment);
        }
        url.set_path(&path);

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }

        url.into()
    }
}

impl std::fmt::Display for UrlBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.build())
    }
}
