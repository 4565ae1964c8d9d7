//! Salesforce connector construction and endpoint helpers.

use std::sync::Arc;

use connectors_common::{
    ApiClient, Authenticator, BulkWriteSupport, HttpClient, Provider, ProviderCatalog, UrlBuilder,
};

use crate::error::Result;
use crate::faults;

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "59.0";

/// Parameters for [`Connector::new`].
#[derive(Clone)]
pub struct SalesforceParams {
    http: HttpClient,
    auth: Arc<dyn Authenticator>,
    workspace: Option<String>,
    api_version: String,
}

impl std::fmt::Debug for SalesforceParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceParams")
            .field("auth", &self.auth)
            .field("workspace", &self.workspace)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl SalesforceParams {
    /// `auth` is attached to every request the connector sends.
    pub fn new(http: HttpClient, auth: impl Authenticator + 'static) -> Self {
        Self {
            http,
            auth: Arc::new(auth),
            workspace: None,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// The org's My Domain subdomain, e.g. `acme` for `acme.my.salesforce.com`.
    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }
}

/// Salesforce connector.
#[derive(Debug, Clone)]
pub struct Connector {
    pub(crate) client: ApiClient,
    base_url: String,
    api_version: String,
    bulk_write: BulkWriteSupport,
}

impl Connector {
    /// Build a connector, resolving the base URL from `catalog`.
    pub fn new(catalog: &ProviderCatalog, params: SalesforceParams) -> Result<Self> {
        let version = params.api_version.trim();
        let valid_version = version
            .split_once('.')
            .is_some_and(|(major, minor)| {
                !major.is_empty()
                    && !minor.is_empty()
                    && major.chars().all(|c| c.is_ascii_digit())
                    && minor.chars().all(|c| c.is_ascii_digit())
            });
        if !valid_version {
            return Err(connectors_common::Error::new(connectors_common::ErrorKind::Config(
                format!("invalid API version '{}', expected e.g. '{}'", version, DEFAULT_API_VERSION),
            ))
            .into());
        }

        let info = catalog.read_info(&Provider::SALESFORCE, params.workspace.as_deref())?;

        let client = ApiClient::new(params.http, params.auth)
            .with_interpreter(faults::interpreter());

        Ok(Self {
            client,
            base_url: info.base_url.trim_end_matches('/').to_string(),
            api_version: version.to_string(),
            bulk_write: info.bulk_write,
        })
    }

    pub fn provider(&self) -> Provider {
        Provider::SALESFORCE
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Bulk write modes enabled for this connector.
    pub fn bulk_write_support(&self) -> BulkWriteSupport {
        self.bulk_write
    }

    /// URL under `/services/data/vXX.X`.
    pub(crate) fn rest_url(&self, path: &str) -> Result<UrlBuilder> {
        let version = format!("services/data/v{}", self.api_version);
        Ok(UrlBuilder::new(&self.base_url, [version.as_str(), path])?)
    }

    /// URL of an ingest job resource, `jobs/ingest[/{id}[/{suffix}]]`.
    pub(crate) fn ingest_url(&self, job_id: Option<&str>, suffix: Option<&str>) -> Result<String> {
        let mut url = self.rest_url("jobs/ingest")?;
        if let Some(id) = job_id {
            url = url.with_segment(id);
        }
        if let Some(suffix) = suffix {
            url = url.with_path(suffix);
        }
        Ok(url.build())
    }
}

impl std::fmt::Display for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.Connector", self.provider())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use connectors_common::{BearerToken, ProviderInfo};

    fn params() -> SalesforceParams {
        SalesforceParams::new(HttpClient::default_client().unwrap(), BearerToken::new("tok"))
    }

    #[test]
    fn test_new_resolves_workspace() {
        let conn = Connector::new(&ProviderCatalog::builtin(), params().with_workspace("acme"))
            .unwrap();
        assert_eq!(conn.base_url(), "https://acme.my.salesforce.com");
        assert_eq!(conn.api_version(), "59.0");
        assert_eq!(conn.to_string(), "salesforce.Connector");
        assert!(conn.bulk_write_support().upsert);
    }

    #[test]
    fn test_new_requires_workspace() {
        let err = Connector::new(&ProviderCatalog::builtin(), params()).unwrap_err();
        match err.kind {
            ErrorKind::Client { class, .. } => {
                assert_eq!(class, connectors_common::ErrorClass::Caller)
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("workspace"));
    }

    #[test]
    fn test_new_rejects_bad_api_version() {
        for version in ["", "59", "v59.0", "59.x"] {
            let err = Connector::new(
                &ProviderCatalog::builtin(),
                params().with_workspace("acme").with_api_version(version),
            )
            .unwrap_err();
            assert!(err.to_string().contains("API version"), "{version:?}");
        }
    }

    #[test]
    fn test_ingest_urls() {
        let catalog = ProviderCatalog::builtin().with(
            Provider::SALESFORCE,
            ProviderInfo::new("Salesforce", "http://127.0.0.1:8080/"),
        );
        let conn = Connector::new(&catalog, params().with_api_version("62.0")).unwrap();

        assert_eq!(
            conn.ingest_url(None, None).unwrap(),
            "http://127.0.0.1:8080/services/data/v62.0/jobs/ingest"
        );
        assert_eq!(
            conn.ingest_url(Some("750xx"), Some("batches")).unwrap(),
            "http://127.0.0.1:8080/services/data/v62.0/jobs/ingest/750xx/batches"
        );
        assert_eq!(
            conn.rest_url("sobjects/Account").unwrap().with_segment("001/x").build(),
            "http://127.0.0.1:8080/services/data/v62.0/sobjects/Account/001%2Fx"
        );
    }
}
