//! Response envelope decoding.
//!
//! Provider payloads vary per object and per call, so successful bodies are
//! decoded into a generic [`Document`] tree instead of a fixed schema. Typed
//! accessors on the tree return [`ErrorKind::InvalidType`] or
//! [`ErrorKind::KeyNotFound`] instead of panicking.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, ErrorKind, Result};
use crate::response::Response;
use crate::xml::XmlNode;

/// A parsed `Content-Type` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    essence: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    /// Parse a header value such as `application/json; charset=UTF-8`.
    pub fn parse(value: &str) -> Result<Self> {
        let mut parts = value.split(';');
        let essence = parts.next().unwrap_or_default().trim().to_ascii_lowercase();

        let valid = match essence.split_once('/') {
            Some((ty, sub)) => {
                !ty.is_empty()
                    && !sub.is_empty()
                    && !sub.contains('/')
                    && !essence.contains(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(Error::new(ErrorKind::InvalidContentType(value.to_string())));
        }

        let mut params = Vec::new();
        for param in parts {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let (key, val) = param
                .split_once('=')
                .ok_or_else(|| Error::new(ErrorKind::InvalidContentType(value.to_string())))?;
            params.push((
                key.trim().to_ascii_lowercase(),
                val.trim().trim_matches('"').to_string(),
            ));
        }

        Ok(Self { essence, params })
    }

    /// The `type/subtype` part, lowercased.
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// Look up a parameter such as `charset`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns true for `application/json` and `+json` suffixed types.
    pub fn is_json(&self) -> bool {
        self.essence == "application/json" || self.essence.ends_with("+json")
    }

    /// Returns true for `application/xml`, `text/xml` and `+xml` suffixed types.
    pub fn is_xml(&self) -> bool {
        self.essence == "application/xml"
            || self.essence == "text/xml"
            || self.essence.ends_with("+xml")
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.essence)
    }
}

/// Structured body formats the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    /// The canonical media type for this format.
    pub fn media_type(&self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Xml => "application/xml",
        }
    }

    /// Whether a parsed media type belongs to this format.
    pub fn accepts(&self, media_type: &MediaType) -> bool {
        match self {
            Format::Json => media_type.is_json(),
            Format::Xml => media_type.is_xml(),
        }
    }

    /// Classify a media type, if it is one of the structured formats.
    pub fn of(media_type: &MediaType) -> Option<Format> {
        if media_type.is_json() {
            Some(Format::Json)
        } else if media_type.is_xml() {
            Some(Format::Xml)
        } else {
            None
        }
    }
}

/// Check that a response declares the expected media type.
///
/// A missing `Content-Type` passes; an unparsable one is
/// [`ErrorKind::InvalidContentType`] and a different one is
/// [`ErrorKind::UnexpectedContentType`].
pub fn expect_media_type(
    response: &Response,
    expected: &str,
    accepts: impl Fn(&MediaType) -> bool,
) -> Result<()> {
    if let Some(media_type) = response.media_type() {
        let media_type = media_type?;
        if !accepts(&media_type) {
            return Err(Error::new(ErrorKind::UnexpectedContentType {
                expected: expected.to_string(),
                actual: media_type.essence().to_string(),
            }));
        }
    }
    Ok(())
}

/// Decode a buffered response body as `format`.
///
/// Returns `Ok(None)` when the body is empty (e.g. `204 No Content`).
pub fn decode(response: &Response, format: Format) -> Result<Option<Document>> {
    expect_media_type(response, format.media_type(), |mt| format.accepts(mt))?;

    if response.is_empty() {
        return Ok(None);
    }

    let document = match format {
        Format::Json => {
            let value: Value = serde_json::from_slice(response.body()).map_err(|e| {
                Error::with_source(
                    ErrorKind::Decode(format!(
                        "failed to decode response body (status {}) as JSON: {}",
                        response.status(),
                        e
                    )),
                    e,
                )
            })?;
            Document::Json(value)
        }
        Format::Xml => Document::Xml(XmlNode::parse(response.body())?),
    };

    Ok(Some(document))
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Json(Value),
    Xml(XmlNode),
}

impl Document {
    /// The format the document was decoded from.
    pub fn format(&self) -> Format {
        match self {
            Document::Json(_) => Format::Json,
            Document::Xml(_) => Format::Xml,
        }
    }

    /// The root JSON node.
    pub fn json(&self) -> Result<JsonNode<'_>> {
        match self {
            Document::Json(value) => Ok(JsonNode::new(value)),
            Document::Xml(_) => Err(invalid_type("json document", "xml document")),
        }
    }

    /// The root XML element.
    pub fn xml(&self) -> Result<&XmlNode> {
        match self {
            Document::Xml(node) => Ok(node),
            Document::Json(_) => Err(invalid_type("xml document", "json document")),
        }
    }

    /// Deserialize a JSON document into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        self.json()?.deserialize()
    }
}

/// A borrowed view into a JSON tree with typed accessors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsonNode<'a> {
    value: &'a Value,
}

impl<'a> JsonNode<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    /// The underlying value.
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Name of the node's type, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self.value {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Require an object and return its entries in document order.
    pub fn as_object(&self) -> Result<Vec<(&'a str, JsonNode<'a>)>> {
        self.value
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.as_str(), JsonNode::new(v)))
                    .collect()
            })
            .ok_or_else(|| invalid_type("object", self.kind()))
    }

    pub fn as_array(&self) -> Result<Vec<JsonNode<'a>>> {
        self.value
            .as_array()
            .map(|items| items.iter().map(JsonNode::new).collect())
            .ok_or_else(|| invalid_type("array", self.kind()))
    }

    pub fn as_str(&self) -> Result<&'a str> {
        self.value
            .as_str()
            .ok_or_else(|| invalid_type("string", self.kind()))
    }

    pub fn as_i64(&self) -> Result<i64> {
        self.value
            .as_i64()
            .ok_or_else(|| invalid_type("integer", self.kind()))
    }

    pub fn as_f64(&self) -> Result<f64> {
        self.value
            .as_f64()
            .ok_or_else(|| invalid_type("number", self.kind()))
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.value
            .as_bool()
            .ok_or_else(|| invalid_type("bool", self.kind()))
    }

    /// Look up a key on an object node.
    pub fn get(&self, key: &str) -> Result<JsonNode<'a>> {
        self.get_opt(key)?
            .ok_or_else(|| Error::new(ErrorKind::KeyNotFound(key.to_string())))
    }

    /// Look up a key on an object node, returning `None` if it is absent.
    pub fn get_opt(&self, key: &str) -> Result<Option<JsonNode<'a>>> {
        let map = self
            .value
            .as_object()
            .ok_or_else(|| invalid_type("object", self.kind()))?;
        Ok(map.get(key).map(JsonNode::new))
    }

    /// Shorthand for `get(key)?.as_str()`, naming the key on type mismatch.
    pub fn get_str(&self, key: &str) -> Result<&'a str> {
        let node = self.get(key)?;
        node.as_str()
            .map_err(|_| invalid_type(&format!("string at '{}'", key), node.kind()))
    }

    /// Deserialize this node into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(self.value).map_err(|e| {
            Error::with_source(ErrorKind::Decode(e.to_string()), e)
        })
    }
}

fn invalid_type(expected: &str, actual: &str) -> Error {
    Error::new(ErrorKind::InvalidType {
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn response(content_type: Option<&str>, body: &str) -> Response {
        let mut headers = HashMap::new();
        if let Some(ct) = content_type {
            headers.insert("Content-Type".to_string(), ct.to_string());
        }
        Response::new(200, headers, body.to_string())
    }

    #[test]
    fn test_media_type_parse() {
        let mt = MediaType::parse("Application/JSON; charset=UTF-8").unwrap();
        assert_eq!(mt.essence(), "application/json");
        assert_eq!(mt.param("charset"), Some("UTF-8"));
        assert!(mt.is_json());
        assert!(!mt.is_xml());

        let mt = MediaType::parse("application/soap+xml").unwrap();
        assert!(mt.is_xml());
        assert_eq!(Format::of(&mt), Some(Format::Xml));

        let mt = MediaType::parse("text/html").unwrap();
        assert_eq!(Format::of(&mt), None);
    }

    #[test]
    fn test_media_type_parse_rejects_garbage() {
        for bad in ["", "json", "application/", "/json", "a/b/c", "text/html; charset"] {
            let err = MediaType::parse(bad).unwrap_err();
            assert!(
                matches!(err.kind, ErrorKind::InvalidContentType(_)),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_decode_json() {
        let resp = response(Some("application/json"), r#"{"id":"750xx","state":"Open"}"#);
        let doc = decode(&resp, Format::Json).unwrap().unwrap();
        let root = doc.json().unwrap();
        assert_eq!(root.get_str("id").unwrap(), "750xx");
        assert_eq!(root.get_str("state").unwrap(), "Open");
    }

    #[test]
    fn test_decode_without_content_type_still_parses() {
        let resp = response(None, r#"[1, 2]"#);
        let doc = decode(&resp, Format::Json).unwrap().unwrap();
        assert_eq!(doc.json().unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_decode_html_is_unexpected_content_type() {
        let resp = response(Some("text/html"), "<html><body>Bad gateway</body></html>");
        let err = decode(&resp, Format::Json).unwrap_err();
        match err.kind {
            ErrorKind::UnexpectedContentType { expected, actual } => {
                assert_eq!(expected, "application/json");
                assert_eq!(actual, "text/html");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = decode(&resp, Format::Xml).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnexpectedContentType { .. }));
    }

    #[test]
    fn test_decode_unparsable_content_type() {
        let resp = response(Some("not a media type"), "{}");
        let err = decode(&resp, Format::Json).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidContentType(_)));
    }

    #[test]
    fn test_decode_empty_body() {
        let resp = response(Some("application/json"), "");
        assert!(decode(&resp, Format::Json).unwrap().is_none());
    }

    #[test]
    fn test_decode_malformed_json() {
        let resp = response(Some("application/json"), "{not json");
        let err = decode(&resp, Format::Json).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Decode(_)));
    }

    #[test]
    fn test_decode_xml() {
        let resp = response(Some("text/xml; charset=utf-8"), "<root><id>1</id></root>");
        let doc = decode(&resp, Format::Xml).unwrap().unwrap();
        assert_eq!(doc.format(), Format::Xml);
        assert_eq!(doc.xml().unwrap().child("id").unwrap().text(), "1");
        assert!(matches!(
            doc.json().unwrap_err().kind,
            ErrorKind::InvalidType { .. }
        ));
    }

    #[test]
    fn test_json_accessor_type_mismatch() {
        let value = serde_json::json!({"state": 5, "nested": {"flag": true}});
        let root = JsonNode::new(&value);

        let err = root.get_str("state").unwrap_err();
        match err.kind {
            ErrorKind::InvalidType { expected, actual } => {
                assert!(expected.contains("state"));
                assert_eq!(actual, "number");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(root.get("nested").unwrap().get("flag").unwrap().as_bool().unwrap());
        assert!(matches!(
            root.get("missing").unwrap_err().kind,
            ErrorKind::KeyNotFound(_)
        ));
        assert!(root.get_opt("missing").unwrap().is_none());
        assert!(matches!(
            root.get("state").unwrap().get("x").unwrap_err().kind,
            ErrorKind::InvalidType { .. }
        ));
    }

    #[test]
    fn test_json_deserialize() {
        #[derive(serde::Deserialize)]
        struct Job {
            id: String,
        }

        let doc = Document::Json(serde_json::json!({"id": "750xx", "extra": 1}));
        let job: Job = doc.deserialize().unwrap();
        assert_eq!(job.id, "750xx");
    }
}
