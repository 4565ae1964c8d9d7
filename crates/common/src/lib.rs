//! # connectors-common
//!
//! Provider-independent plumbing shared by every connector:
//!
//! - [`HttpClient`]: pooled transport with compression, timeouts and
//!   cancellation; sends each request exactly once
//! - [`Authenticator`]: credentials attached to each request
//! - [`decode`]: content-type validation and decoding of JSON/XML bodies
//!   into a generic [`Document`]
//! - [`FaultInterpreter`]: classification of non-2xx responses, pluggable
//!   per content type
//! - [`ApiClient`]: the above composed into an authenticated JSON/XML client
//! - [`ProviderCatalog`]: provider base URLs, resolved per workspace
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Connector Layer                          │
//! │  (connectors-salesforce, ...)                               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ApiClient                              │
//! │  - Authenticator stamps credentials                         │
//! │  - Success: decode() -> Document                            │
//! │  - Failure: FaultInterpreter -> Error                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HttpClient                             │
//! │  - Raw HTTP with compression, timeouts, cancellation        │
//! │  - Fully buffers the response body                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use connectors_common::{ApiClient, BearerToken, HttpClient, UrlBuilder};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> connectors_common::Result<()> {
//! let api = ApiClient::new(HttpClient::default_client()?, BearerToken::new("token"));
//! let url = UrlBuilder::new("https://acme.my.salesforce.com", ["services/data/v59.0/limits"])?;
//!
//! if let Some(doc) = api.get_json(&CancellationToken::new(), &url.build()).await? {
//!     let remaining = doc.json()?.get("DailyApiRequests")?.get("Remaining")?.as_i64()?;
//!     println!("{remaining} calls left today");
//! }
//! # Ok(())
//! # }
//! ```

mod api;
mod auth;
mod client;
mod config;
pub mod decode;
mod endpoint;
mod error;
pub mod interpreter;
mod providers;
mod request;
mod response;
mod xml;

pub use api::{ApiClient, ErrorHandler};
pub use auth::{Authenticator, BasicAuth, BearerToken, NoAuth};
pub use client::HttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use decode::{Document, Format, JsonNode, MediaType};
pub use endpoint::UrlBuilder;
pub use error::{Error, ErrorClass, ErrorKind, Result};
pub use interpreter::{FaultInterpreter, FaultResponder, FnResponder};
pub use providers::{BulkWriteSupport, Provider, ProviderCatalog, ProviderInfo};
pub use request::{RequestBody, RequestBuilder, RequestMethod};
pub use response::Response;
pub use xml::XmlNode;

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("connectors/", env!("CARGO_PKG_VERSION"));
