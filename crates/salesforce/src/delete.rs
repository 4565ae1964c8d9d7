//! Single-record delete through the REST API.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::connector::Connector;
use crate::error::{Error, ErrorKind, Result};
use crate::types::{DeleteParams, DeleteResult};

impl Connector {
    /// Delete one record. Salesforce answers 204 with no body.
    #[instrument(skip(self, cancel), fields(object = %params.object_name))]
    pub async fn delete(
        &self,
        cancel: &CancellationToken,
        params: DeleteParams,
    ) -> Result<DeleteResult> {
        if params.object_name.trim().is_empty() {
            return Err(Error::new(ErrorKind::MissingParam("object_name".into())));
        }
        if params.record_id.trim().is_empty() {
            return Err(Error::new(ErrorKind::MissingParam("record_id".into())));
        }

        let url = self
            .rest_url("sobjects")?
            .with_segment(&params.object_name)
            .with_segment(&params.record_id)
            .build();
        self.client.delete(cancel, &url).await?;

        info!(record_id = %params.record_id, "Deleted record");
        Ok(DeleteResult { success: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::SalesforceParams;
    use connectors_common::{BearerToken, HttpClient, Provider, ProviderCatalog, ProviderInfo};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn connector(server: &MockServer) -> Connector {
        let catalog = ProviderCatalog::new()
            .with(Provider::SALESFORCE, ProviderInfo::new("Salesforce", server.uri()));
        let params =
            SalesforceParams::new(HttpClient::default_client().unwrap(), BearerToken::new("tok"));
        Connector::new(&catalog, params).unwrap()
    }

    #[tokio::test]
    async fn test_delete_record() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/services/data/v59.0/sobjects/Account/001xx0000001"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let result = connector(&server)
            .delete(
                &CancellationToken::new(),
                DeleteParams::new("Account", "001xx0000001"),
            )
            .await
            .unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_delete_missing_record() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!([
                {"errorCode": "ENTITY_IS_DELETED", "message": "entity is deleted"}
            ])))
            .mount(&server)
            .await;

        let err = connector(&server)
            .delete(&CancellationToken::new(), DeleteParams::new("Account", "001gone"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ENTITY_IS_DELETED: entity is deleted"));
        assert_eq!(err.client_error().and_then(|e| e.status()), Some(404));
    }

    #[tokio::test]
    async fn test_delete_requires_params() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;
        let conn = connector(&server);
        let cancel = CancellationToken::new();

        let err = conn
            .delete(&cancel, DeleteParams::new("", "001"))
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MissingParam(ref p) if p == "object_name"));

        let err = conn
            .delete(&cancel, DeleteParams::new("Account", " "))
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MissingParam(ref p) if p == "record_id"));
    }
}
