//! # connectors
//!
//! Uniform access to SaaS HTTP APIs, with asynchronous bulk ingestion.
//!
//! ## Crates
//!
//! - **connectors-common** - Authenticated transport, response envelope
//!   decoding (JSON and XML), fault interpretation, provider catalog
//! - **connectors-salesforce** - Bulk API 2.0 ingest jobs, failure
//!   reconciliation, single-record delete
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use connectors::common::{BearerToken, HttpClient, ProviderCatalog};
//! use connectors::salesforce::{Connector, DeleteParams, SalesforceParams};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = ProviderCatalog::builtin();
//!     let connector = Connector::new(
//!         &catalog,
//!         SalesforceParams::new(HttpClient::default_client()?, BearerToken::new("token"))
//!             .with_workspace("acme"),
//!     )?;
//!
//!     connector
//!         .delete(&CancellationToken::new(), DeleteParams::new("Account", "001xx0000001"))
//!         .await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "common")]
pub use connectors_common as common;
#[cfg(feature = "salesforce")]
pub use connectors_salesforce as salesforce;

#[cfg(feature = "common")]
pub use connectors_common::{ClientConfig, HttpClient, ProviderCatalog};
#[cfg(feature = "salesforce")]
pub use connectors_salesforce::Connector;
