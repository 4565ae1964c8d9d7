//! Authenticated JSON/XML client.

use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use crate::auth::Authenticator;
use crate::client::HttpClient;
use crate::decode::{decode, Document, Format};
use crate::error::{Error, Result};
use crate::interpreter::FaultInterpreter;
use crate::request::RequestBuilder;
use crate::response::Response;

/// Replaces the [`FaultInterpreter`] entirely for providers whose faults
/// do not follow the content-type dispatch.
pub type ErrorHandler = Arc<dyn Fn(&Response) -> Error + Send + Sync>;

/// HTTP client that authenticates every request, decodes successful bodies
/// into [`Document`]s and turns every non-2xx response into a typed error.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    auth: Arc<dyn Authenticator>,
    interpreter: FaultInterpreter,
    error_handler: Option<ErrorHandler>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("http", &self.http)
            .field("auth", &self.auth)
            .field("interpreter", &self.interpreter)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(http: HttpClient, auth: impl Authenticator + 'static) -> Self {
        Self {
            http,
            auth: Arc::new(auth),
            interpreter: FaultInterpreter::default(),
            error_handler: None,
        }
    }

    /// Install the interpreter used for error responses.
    pub fn with_interpreter(mut self, interpreter: FaultInterpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Bypass the interpreter and hand every error response to `handler`.
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Authenticate and send a request. Non-2xx responses become errors.
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        request: RequestBuilder,
    ) -> Result<Response> {
        let request = self.auth.authenticate(request);
        let response = self.http.execute(cancel, request).await?;

        if response.is_success() {
            Ok(response)
        } else {
            let err = self.interpret(&response);
            warn!(status = response.status(), error = %err, "Request failed");
            Err(err)
        }
    }

    fn interpret(&self, response: &Response) -> Error {
        match &self.error_handler {
            Some(handler) => handler(response),
            None => self.interpreter.interpret(response),
        }
    }

    async fn send_decoded(
        &self,
        cancel: &CancellationToken,
        request: RequestBuilder,
        format: Format,
    ) -> Result<Option<Document>> {
        let request = request.accept(format.media_type());
        let response = self.execute(cancel, request).await?;
        decode(&response, format)
    }

    /// GET a JSON document. An empty body yields `None`.
    #[instrument(skip(self, cancel))]
    pub async fn get_json(&self, cancel: &CancellationToken, url: &str) -> Result<Option<Document>> {
        self.send_decoded(cancel, self.http.get(url), Format::Json)
            .await
    }

    /// POST a JSON body and decode the JSON response.
    #[instrument(skip(self, cancel, body))]
    pub async fn post_json<B: Serialize>(
        &self,
        cancel: &CancellationToken,
        url: &str,
        body: &B,
    ) -> Result<Option<Document>> {
        let request = self.http.post(url).json(body)?;
        self.send_decoded(cancel, request, Format::Json).await
    }

    /// PATCH a JSON body and decode the JSON response, if any.
    #[instrument(skip(self, cancel, body))]
    pub async fn patch_json<B: Serialize>(
        &self,
        cancel: &CancellationToken,
        url: &str,
        body: &B,
    ) -> Result<Option<Document>> {
        let request = self.http.patch(url).json(body)?;
        self.send_decoded(cancel, request, Format::Json).await
    }

    /// PUT a raw body. The response is returned undecoded.
    #[instrument(skip(self, cancel, body), fields(len = body.len()))]
    pub async fn put_bytes(
        &self,
        cancel: &CancellationToken,
        url: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<Response> {
        let request = self.http.put(url).bytes(body, content_type);
        self.execute(cancel, request).await
    }

    /// GET a non-structured body such as a CSV report.
    #[instrument(skip(self, cancel))]
    pub async fn get_raw(
        &self,
        cancel: &CancellationToken,
        url: &str,
        accept: &str,
    ) -> Result<Response> {
        let request = self.http.get(url).accept(accept);
        self.execute(cancel, request).await
    }

    /// DELETE a resource. Providers usually answer 204 with no body.
    #[instrument(skip(self, cancel))]
    pub async fn delete(&self, cancel: &CancellationToken, url: &str) -> Result<Option<Document>> {
        self.send_decoded(
            cancel,
            self.http.delete(url),
            Format::Json,
        )
        .await
    }

    /// POST an XML (SOAP) envelope and decode the XML response.
    #[instrument(skip(self, cancel, body))]
    pub async fn post_xml(
        &self,
        cancel: &CancellationToken,
        url: &str,
        body: impl Into<String>,
    ) -> Result<Option<Document>> {
        let request = self.http.post(url).xml(body);
        self.send_decoded(cancel, request, Format::Xml).await
    }
}
