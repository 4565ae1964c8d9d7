//! Core HTTP transport with compression, cancellation and request tracing.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{RequestAuth, RequestBody, RequestBuilder, RequestMethod};
use crate::response::Response;

/// HTTP transport shared by every connector.
///
/// Cloning is cheap and clones share one connection pool. Each request is
/// sent exactly once; non-2xx responses are returned as-is for the caller to
/// interpret.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Send a request and buffer the response.
    ///
    /// Returns [`ErrorKind::Cancelled`] as soon as `cancel` fires, whether the
    /// request is still in flight or the body is being read.
    #[instrument(skip(self, cancel, request), fields(method = ?request.method, url = %request.url))]
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        request: RequestBuilder,
    ) -> Result<Response> {
        if cancel.is_cancelled() {
            return Err(Error::new(ErrorKind::Cancelled));
        }

        let method = request.method;
        let req = self.build(request);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(?method, "Request cancelled");
                Err(Error::new(ErrorKind::Cancelled))
            }
            result = self.send(req) => result,
        }
    }

    fn build(&self, request: RequestBuilder) -> reqwest::RequestBuilder {
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), &request.url);

        match request.auth {
            Some(RequestAuth::Bearer(token)) => req = req.bearer_auth(token),
            Some(RequestAuth::Basic { user, pass }) => req = req.basic_auth(user, pass),
            None => {}
        }

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            req = match body {
                RequestBody::Json(value) => req.body(value.to_string()),
                RequestBody::Text(text) => req.body(text),
                RequestBody::Bytes(bytes) => req.body(bytes),
            };
        }

        req
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Response> {
        if self.config.enable_tracing {
            debug!("Sending request");
        }

        let response = Response::read(req.send().await?).await?;

        if self.config.enable_tracing {
            let status = response.status();
            let content_length = response.body().len();
            if response.is_success() {
                debug!(status, content_length, "Response received");
            } else {
                info!(status, content_length, "Non-success response");
            }
        }

        Ok(response)
    }

    /// Create a GET request builder.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Get, url)
    }

    /// Create a POST request builder.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Post, url)
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Patch, url)
    }

    /// Create a PUT request builder.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Put, url)
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Delete, url)
    }
}
