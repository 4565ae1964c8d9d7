//! Salesforce error responses.
//!
//! REST endpoints answer with a JSON array of `{errorCode, message, fields}`;
//! SOAP endpoints answer with a SOAP fault envelope.

use connectors_common::interpreter::{
    classify_status, fault_message, json_fault_message, sanitize_error_message,
    soap_fault_message,
};
use connectors_common::{
    Document, Error, ErrorKind, FaultInterpreter, FnResponder, Response, XmlNode,
};
use serde::Deserialize;

/// Salesforce API error response format.
#[derive(Debug, Deserialize)]
struct SalesforceFault {
    #[serde(alias = "errorCode")]
    error_code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FaultBody {
    Many(Vec<SalesforceFault>),
    One(SalesforceFault),
}

/// Interpreter with the Salesforce JSON and SOAP responders installed.
pub(crate) fn interpreter() -> FaultInterpreter {
    FaultInterpreter::new()
        .with_json(FnResponder(interpret_json))
        .with_xml(FnResponder(interpret_xml))
}

fn interpret_json(response: &Response, document: Option<&Document>) -> Error {
    let value = match document {
        Some(Document::Json(value)) => value,
        _ => return classify(response, None, &response.text_lossy()),
    };

    match serde_json::from_value::<FaultBody>(value.clone()) {
        Ok(FaultBody::Many(faults)) if !faults.is_empty() => {
            let message = faults
                .iter()
                .map(|f| fault_message(&f.error_code, &f.message))
                .collect::<Vec<_>>()
                .join("; ");
            classify(response, Some(&faults[0].error_code), &message)
        }
        Ok(FaultBody::One(fault)) => classify(
            response,
            Some(&fault.error_code),
            &fault_message(&fault.error_code, &fault.message),
        ),
        // OAuth endpoints and proxies use other shapes
        _ => {
            let message = json_fault_message(value).unwrap_or_else(|| response.text_lossy());
            classify(response, None, &message)
        }
    }
}

fn interpret_xml(response: &Response, document: Option<&Document>) -> Error {
    let root: Option<&XmlNode> = match document {
        Some(Document::Xml(root)) => Some(root),
        _ => None,
    };

    let code = root
        .and_then(|r| r.find("Fault"))
        .and_then(|f| f.find_text("faultcode"));
    let message = root
        .and_then(soap_fault_message)
        .unwrap_or_else(|| response.text_lossy());

    classify(response, code, &message)
}

/// Status-based classification, except for error codes whose meaning does
/// not match the status Salesforce sends them with.
fn classify(response: &Response, code: Option<&str>, message: &str) -> Error {
    // SOAP fault codes carry a namespace prefix, e.g. "sf:INVALID_SESSION_ID"
    let code = code.map(|c| c.rsplit(':').next().unwrap_or(c));

    match code {
        Some("INVALID_SESSION_ID") => {
            Error::new(ErrorKind::AccessToken(sanitize_error_message(message)))
        }
        Some("REQUEST_LIMIT_EXCEEDED") => Error::new(ErrorKind::RateLimited {
            retry_after: response.retry_after(),
            message: sanitize_error_message(message),
        }),
        _ => classify_status(response.status(), response.retry_after(), message),
    }
}
