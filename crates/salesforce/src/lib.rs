//! # connectors-salesforce
//!
//! Salesforce connector: Bulk API 2.0 ingest jobs, reconciliation of their
//! failed-results reports, and single-record deletes.
//!
//! ## Features
//!
//! - **Bulk upsert and delete** - create a job, upload CSV, close it
//! - **Polling** - one-shot job info plus [`is_done`] for caller-side loops
//! - **Failure details** - failed-results CSV grouped by error message,
//!   split into failed creates and failed updates
//! - **Typed faults** - Salesforce JSON and SOAP error bodies mapped onto
//!   [`connectors_common::ErrorKind`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use connectors_common::{BearerToken, HttpClient, ProviderCatalog};
//! use connectors_salesforce::{
//!     is_done, BulkOperationMode, BulkOperationParams, Connector, SalesforceParams,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = ProviderCatalog::builtin();
//!     let params = SalesforceParams::new(HttpClient::default_client()?, BearerToken::new("token"))
//!         .with_workspace("acme");
//!     let connector = Connector::new(&catalog, params)?;
//!     let cancel = CancellationToken::new();
//!
//!     let csv = "External_Id__c,Name\nA-1,Acme\nA-2,Globex\n";
//!     let job = connector
//!         .bulk_write(
//!             &cancel,
//!             BulkOperationParams::new(
//!                 "Account",
//!                 BulkOperationMode::Upsert,
//!                 std::io::Cursor::new(csv.as_bytes().to_vec()),
//!             )
//!             .with_external_id_field("External_Id__c"),
//!         )
//!         .await?;
//!
//!     let info = loop {
//!         let info = connector.get_job_info(&cancel, &job.job_id).await?;
//!         if is_done(info.state) {
//!             break info;
//!         }
//!         tokio::time::sleep(Duration::from_secs(5)).await;
//!     };
//!
//!     let results = connector.fetch_failure_details(&cancel, &info).await?;
//!     if let Some(failures) = &results.failure_details {
//!         for (message, refs) in &failures.failed_creates {
//!             println!("{}: {:?}", message, refs);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod bulk;
mod connector;
mod delete;
mod error;
mod faults;
mod reconcile;
mod types;

pub use bulk::{incomplete_job_message, is_done};
pub use connector::{Connector, SalesforceParams, DEFAULT_API_VERSION};
pub use error::{BulkPhase, Error, ErrorKind, Result};
pub use reconcile::reconcile_failures;
pub use types::*;
