//! Interpretation of non-2xx responses.
//!
//! The [`FaultInterpreter`] dispatches on the declared content type to a
//! format-specific [`FaultResponder`]. Providers install their own responders
//! to understand provider-specific fault envelopes; anything a responder does
//! not recognise falls back to [`interpret_status`].

use std::sync::{Arc, OnceLock};

use crate::decode::{Document, Format};
use crate::error::{Error, ErrorKind};
use crate::response::Response;
use crate::xml::XmlNode;

/// Turns an error response into a typed error.
pub trait FaultResponder: Send + Sync {
    /// `document` is the decoded body, or `None` if it was empty or malformed.
    fn interpret(&self, response: &Response, document: Option<&Document>) -> Error;
}

/// Adapts a closure into a [`FaultResponder`].
pub struct FnResponder<F>(pub F);

impl<F> FaultResponder for FnResponder<F>
where
    F: Fn(&Response, Option<&Document>) -> Error + Send + Sync,
{
    fn interpret(&self, response: &Response, document: Option<&Document>) -> Error {
        (self.0)(response, document)
    }
}

/// Responder that understands the common `{code, message}` and SOAP fault shapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericFault;

impl FaultResponder for GenericFault {
    fn interpret(&self, response: &Response, document: Option<&Document>) -> Error {
        let message = match document {
            Some(Document::Json(value)) => json_fault_message(value),
            Some(Document::Xml(node)) => soap_fault_message(node),
            None => None,
        }
        .unwrap_or_else(|| response.text_lossy());

        interpret_status(response, &message)
    }
}

/// Dispatches error responses to a responder per content type.
#[derive(Clone)]
pub struct FaultInterpreter {
    json: Arc<dyn FaultResponder>,
    xml: Arc<dyn FaultResponder>,
}

impl std::fmt::Debug for FaultInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultInterpreter").finish_non_exhaustive()
    }
}

impl Default for FaultInterpreter {
    fn default() -> Self {
        Self {
            json: Arc::new(GenericFault),
            xml: Arc::new(GenericFault),
        }
    }
}

impl FaultInterpreter {
    /// Interpreter with the generic responders for both formats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the responder used for JSON error bodies.
    pub fn with_json(mut self, responder: impl FaultResponder + 'static) -> Self {
        self.json = Arc::new(responder);
        self
    }

    /// Install the responder used for XML error bodies.
    pub fn with_xml(mut self, responder: impl FaultResponder + 'static) -> Self {
        self.xml = Arc::new(responder);
        self
    }

    /// Interpret a non-2xx response.
    ///
    /// A missing or unrecognised content type fails closed with
    /// [`ErrorKind::MissingContentType`] / [`ErrorKind::UnexpectedContentType`];
    /// the status-based classification is kept as the error's source, so
    /// [`Error::status`] and [`Error::is_retryable`] still reflect it.
    pub fn interpret(&self, response: &Response) -> Error {
        let media_type = match response.media_type() {
            None => {
                return Error::with_source(
                    ErrorKind::MissingContentType,
                    interpret_status(response, &response.text_lossy()),
                )
            }
            Some(Err(err)) => return err,
            Some(Ok(media_type)) => media_type,
        };

        let Some(format) = Format::of(&media_type) else {
            return Error::with_source(
                ErrorKind::UnexpectedContentType {
                    expected: "application/json or application/xml".to_string(),
                    actual: media_type.essence().to_string(),
                },
                interpret_status(response, &response.text_lossy()),
            );
        };

        let document = parse_lenient(response, format);
        let responder = match format {
            Format::Json => &self.json,
            Format::Xml => &self.xml,
        };
        responder.interpret(response, document.as_ref())
    }
}

fn parse_lenient(response: &Response, format: Format) -> Option<Document> {
    if response.is_empty() {
        return None;
    }
    match format {
        Format::Json => serde_json::from_slice(response.body()).ok().map(Document::Json),
        Format::Xml => XmlNode::parse(response.body()).ok().map(Document::Xml),
    }
}

/// Classify a response by status code alone.
pub fn interpret_status(response: &Response, message: &str) -> Error {
    classify_status(response.status(), response.retry_after(), message)
}

/// Map an HTTP status and message onto the shared error kinds.
pub fn classify_status(
    status: u16,
    retry_after: Option<std::time::Duration>,
    message: &str,
) -> Error {
    let message = sanitize_error_message(message);
    let kind = match status {
        401 => ErrorKind::AccessToken(message),
        403 => ErrorKind::Forbidden(message),
        404 => ErrorKind::NotFound(message),
        429 => ErrorKind::RateLimited {
            retry_after,
            message,
        },
        400..=499 => ErrorKind::Caller { status, message },
        500..=599 => ErrorKind::Server { status, message },
        _ => ErrorKind::UnexpectedStatus { status, message },
    };
    Error::new(kind)
}

/// Join a provider error code and message.
pub fn fault_message(code: &str, message: &str) -> String {
    match (code.is_empty(), message.is_empty()) {
        (true, _) => message.to_string(),
        (false, true) => code.to_string(),
        (false, false) => format!("{}: {}", code, message),
    }
}

/// Extract `code: message` from common JSON fault shapes: a single object,
/// an array of objects, or an object with an `errors` array.
pub fn json_fault_message(value: &serde_json::Value) -> Option<String> {
    const CODE_KEYS: [&str; 4] = ["errorCode", "error_code", "code", "error"];
    const MESSAGE_KEYS: [&str; 4] = ["message", "error_description", "detail", "title"];

    let first_str = |obj: &serde_json::Map<String, serde_json::Value>, keys: &[&str]| {
        keys.iter()
            .find_map(|k| obj.get(*k).and_then(|v| v.as_str()))
            .unwrap_or_default()
            .to_string()
    };

    match value {
        serde_json::Value::Array(items) => items.first().and_then(json_fault_message),
        serde_json::Value::Object(obj) => {
            if let Some(inner) = obj
                .get("errors")
                .and_then(|v| v.as_array())
                .and_then(|items| items.first())
            {
                if let Some(message) = json_fault_message(inner) {
                    return Some(message);
                }
            }

            let code = first_str(obj, &CODE_KEYS);
            let message = first_str(obj, &MESSAGE_KEYS);
            if code.is_empty() && message.is_empty() {
                None
            } else {
                Some(fault_message(&code, &message))
            }
        }
        _ => None,
    }
}

/// Extract `faultcode: faultstring` from a SOAP fault envelope.
pub fn soap_fault_message(root: &XmlNode) -> Option<String> {
    let fault = root.find("Fault")?;
    let code = fault
        .find_text("faultcode")
        .or_else(|| fault.find("Code").and_then(|c| c.find_text("Value")))
        .unwrap_or_default();
    let message = fault
        .find_text("faultstring")
        .or_else(|| fault.find("Reason").and_then(|r| r.find_text("Text")))
        .unwrap_or_default();

    if code.is_empty() && message.is_empty() {
        None
    } else {
        Some(fault_message(code, message))
    }
}

/// Sanitize an error message to prevent exposing sensitive data.
///
/// Tokens and session ids are redacted and long messages are truncated.
pub fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    static TOKEN: OnceLock<Option<regex_lite::Regex>> = OnceLock::new();
    static SESSION: OnceLock<Option<regex_lite::Regex>> = OnceLock::new();

    let mut sanitized = message.trim().to_string();

    // Salesforce-style access tokens: org id, "!", then the opaque part
    if let Some(re) = TOKEN
        .get_or_init(|| regex_lite::Regex::new(r"00[A-Za-z0-9]{13,}[!][A-Za-z0-9_.]+").ok())
    {
        sanitized = re.replace_all(&sanitized, "[REDACTED_TOKEN]").to_string();
    }

    if let Some(re) =
        SESSION.get_or_init(|| regex_lite::Regex::new(r"sid=[A-Za-z0-9]{20,}").ok())
    {
        sanitized = re.replace_all(&sanitized, "sid=[REDACTED]").to_string();
    }

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
