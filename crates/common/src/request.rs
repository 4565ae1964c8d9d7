//! HTTP request building.

use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::Result;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Credentials attached to a single request.
#[derive(Clone)]
pub(crate) enum RequestAuth {
    Bearer(String),
    Basic { user: String, pass: Option<String> },
}

impl std::fmt::Debug for RequestAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestAuth::Bearer(_) => f.write_str("Bearer([REDACTED])"),
            RequestAuth::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("pass", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Builder for outbound HTTP requests.
#[derive(Debug)]
pub struct RequestBuilder {
    pub(crate) method: RequestMethod,
    pub(crate) url: String,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) body: Option<RequestBody>,
    pub(crate) auth: Option<RequestAuth>,
}

/// Request body content.
#[derive(Debug)]
pub enum RequestBody {
    Json(serde_json::Value),
    Text(String),
    Bytes(Bytes),
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            auth: None,
        }
    }

    /// The request method.
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// The target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Look up a header that has been set on this request.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set the bearer token for authentication.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(RequestAuth::Bearer(token.into()));
        self
    }

    /// Set basic authentication credentials.
    pub fn basic_auth(mut self, user: impl Into<String>, pass: Option<String>) -> Self {
        self.auth = Some(RequestAuth::Basic {
            user: user.into(),
            pass,
        });
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the Accept header.
    pub fn accept(self, media_type: &str) -> Self {
        self.header("Accept", media_type)
    }

    /// Set JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)?;
        self.body = Some(RequestBody::Json(value));
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    /// Set raw JSON body.
    pub fn json_value(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self
    }

    /// Set bytes body with an explicit content type.
    pub fn bytes(mut self, body: impl Into<Bytes>, content_type: &str) -> Self {
        self.body = Some(RequestBody::Bytes(body.into()));
        self.headers
            .insert("Content-Type".to_string(), content_type.to_string());
        self
    }

    /// Set CSV body (for bulk uploads).
    pub fn csv(self, data: impl Into<Bytes>) -> Self {
        self.bytes(data, "text/csv")
    }

    /// Set XML body (for SOAP endpoints).
    pub fn xml(mut self, data: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(data.into()));
        self.headers
            .insert("Content-Type".to_string(), "text/xml; charset=UTF-8".to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = RequestBuilder::new(RequestMethod::Get, "https://example.com/api")
            .bearer_auth("token123")
            .header("X-Custom", "value")
            .accept("application/json");

        assert_eq!(req.method(), RequestMethod::Get);
        assert_eq!(req.url(), "https://example.com/api");
        assert!(matches!(req.auth, Some(RequestAuth::Bearer(ref t)) if t == "token123"));
        assert_eq!(req.header_value("x-custom"), Some("value"));
        assert_eq!(req.header_value("Accept"), Some("application/json"));
    }

    #[test]
    fn test_json_body() {
        let data = serde_json::json!({"object": "Account"});
        let req = RequestBuilder::new(RequestMethod::Post, "https://example.com")
            .json(&data)
            .unwrap();

        assert!(matches!(req.body, Some(RequestBody::Json(_))));
        assert_eq!(req.header_value("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_csv_body() {
        let req = RequestBuilder::new(RequestMethod::Put, "https://example.com")
            .csv("Id,Name\n001xx,Test".as_bytes().to_vec());

        assert!(matches!(req.body, Some(RequestBody::Bytes(_))));
        assert_eq!(req.header_value("Content-Type"), Some("text/csv"));
    }

    #[test]
    fn test_auth_debug_is_redacted() {
        let req = RequestBuilder::new(RequestMethod::Get, "https://example.com")
            .basic_auth("user", Some("hunter2".to_string()));
        let debug = format!("{:?}", req);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
