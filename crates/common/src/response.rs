//! Fully buffered HTTP responses.

use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;

use crate::decode::MediaType;
use crate::error::{Error, ErrorKind, Result};

/// An HTTP response whose body has been read to the end.
///
/// The transport drains the body before handing the response over, so
/// status, headers and body can be inspected in any order and any number of
/// times.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl Response {
    /// Build a response from its parts. Header names are matched case-insensitively.
    pub fn new(status: u16, headers: HashMap<String, String>, body: impl Into<Bytes>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();

        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Drain a reqwest response into a buffered one.
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                Error::with_source(ErrorKind::Timeout, e)
            } else {
                Error::with_source(
                    ErrorKind::Connection(format!("error reading response body: {}", e)),
                    e,
                )
            }
        })?;

        Ok(Self::new(status, headers, body))
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type").filter(|v| !v.trim().is_empty())
    }

    /// Parse the Content-Type header, if present.
    pub fn media_type(&self) -> Option<Result<MediaType>> {
        self.content_type().map(MediaType::parse)
    }

    /// Get the Retry-After header as a Duration.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }

    /// The raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume the response and return its body.
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Returns true if the body has no content.
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// The body as UTF-8 text, replacing invalid sequences.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
