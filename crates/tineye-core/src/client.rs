//! The request primitive and the collection operations every engine shares.

use crate::config::{ClientConfig, ResponseMode};
use crate::error::{Result, TinEyeError};
use crate::params::{FilePart, Params, RequestOptions};
use crate::response::{RawResponse, ServiceResponse, Status};
use crate::transport::{ApiRequest, ReqwestTransport, Transport};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Connection to one TinEye services API.
///
/// Holds the validated config and the transport; cloning is cheap and clones
/// share the underlying HTTP connection pool. Engine clients embed one of
/// these and build their operations on [`ServiceClient::request`].
#[derive(Clone)]
pub struct ServiceClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    options: RequestOptions,
}

impl ServiceClient {
    /// Client over HTTP with a fresh `reqwest` connection pool.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            options: RequestOptions::default(),
        }
    }

    /// A clone whose calls use `options`, e.g. a shorter timeout.
    pub fn with_request_options(&self, options: RequestOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn request_options(&self) -> RequestOptions {
        self.options
    }

    /// Send one request to `{api_url}{method}/` and decode the envelope.
    ///
    /// Parameter-only requests go out as GET, requests with attachments as
    /// multipart POST. Non-2xx statuses are [`TinEyeError::Transport`].
    /// `warn`/`fail` envelopes are returned as-is in lenient mode and raised
    /// as [`TinEyeError::Warning`]/[`TinEyeError::Service`] in strict mode.
    /// There are no retries.
    pub async fn request<T>(
        &self,
        method: &str,
        params: Params,
        files: Vec<FilePart>,
    ) -> Result<ServiceResponse<T>>
    where
        T: DeserializeOwned + Default,
    {
        let request = ApiRequest {
            url: self.config.method_url(method),
            params,
            files,
            credentials: self.config.credentials().cloned(),
            timeout: self.options.timeout.or(self.config.timeout()),
        };

        tracing::debug!(
            method,
            http = %request.http_method(),
            params = request.params.len(),
            files = request.files.len(),
            "Sending TinEye request"
        );

        let reply = self.transport.execute(request).await?;
        if !reply.is_success() {
            tracing::debug!(method, status = reply.status, "TinEye request failed");
            return Err(TinEyeError::Transport {
                status: reply.status,
                body: reply.body,
            });
        }

        let response = RawResponse::decode(method, &reply.body)?.into_typed::<T>(method)?;
        match response.status {
            Status::Ok => tracing::debug!(method, "TinEye response ok"),
            status => tracing::warn!(method, ?status, errors = ?response.error, "TinEye response not ok"),
        }

        match (self.config.response_mode(), response.status) {
            (ResponseMode::Strict, Status::Warn) => Err(TinEyeError::Warning(response.error)),
            (ResponseMode::Strict, Status::Fail) => Err(TinEyeError::Service(response.error)),
            _ => Ok(response),
        }
    }
}

impl fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("config", &self.config)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Collection management shared by every engine.
#[async_trait]
pub trait Collection: Send + Sync {
    /// The connection operations are sent through.
    fn service(&self) -> &ServiceClient;

    /// Remove images from the collection by collection filepath.
    ///
    /// Missing filepaths come back as a `warn` response (or
    /// [`TinEyeError::Warning`] in strict mode), with one
    /// `"<path>: Failed to remove from index."` message per path.
    async fn delete<S>(&self, filepaths: &[S]) -> Result<ServiceResponse>
    where
        S: AsRef<str> + Sync,
    {
        let mut params = Params::new();
        params.insert_indexed_str("filepaths", filepaths);
        self.service().request("delete", params, Vec::new()).await
    }

    /// Number of images in the collection, as `result == [n]`.
    async fn count(&self) -> Result<ServiceResponse<Vec<u64>>> {
        self.service().request("count", Params::new(), Vec::new()).await
    }

    /// Collection filepaths, paginated. Offset and limit go out unchanged.
    async fn list(&self, offset: u32, limit: u32) -> Result<ServiceResponse<Vec<String>>> {
        let mut params = Params::new();
        params.insert("offset", offset).insert("limit", limit);
        self.service().request("list", params, Vec::new()).await
    }

    /// Check that the API server is up.
    async fn ping(&self) -> Result<ServiceResponse<Value>> {
        self.service().request("ping", Params::new(), Vec::new()).await
    }
}

/// Default page size of [`Collection::list`] in the service's own API.
pub const DEFAULT_LIST_LIMIT: u32 = 20;

impl Collection for ServiceClient {
    fn service(&self) -> &ServiceClient {
        self
    }
}
