//! Package existence check against a registry.

use async_trait::async_trait;
use reqwest::{Client, Url};
use service_core::observability::TracedClientExt;
use tracing::instrument;

use super::stage::{ensure_success, HttpError, StageError};

#[async_trait]
pub trait RegistryProber: Send + Sync {
    /// Succeeds when the registry answers below 400 for `package`.
    async fn exists(&self, package: &str, registry: &str) -> Result<(), StageError>;
}

/// Checks an npm-compatible registry with a single GET.
#[derive(Clone, Default)]
pub struct HttpRegistryProber {
    client: Client,
}

impl HttpRegistryProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Resolve `package` against `registry` the way a browser resolves a relative
/// link: a registry path without a trailing slash loses its last segment.
pub fn package_url(registry: &str, package: &str) -> Result<Url, HttpError> {
    Url::parse(registry)
        .and_then(|base| base.join(package))
        .map_err(|e| HttpError::invalid_url(registry, e))
}

#[async_trait]
impl RegistryProber for HttpRegistryProber {
    #[instrument(skip(self))]
    async fn exists(&self, package: &str, registry: &str) -> Result<(), StageError> {
        let url = package_url(registry, package).map_err(StageError::Network)?;

        let response = self
            .client
            .traced_get(url)
            .send()
            .await
            .map_err(|e| StageError::Network(HttpError::Transport(e)))?;

        let status = response.status();
        tracing::debug!(status = %status, "Registry lookup response");

        ensure_success(response).map_err(|_| StageError::NotFound(status))?;
        Ok(())
    }
}
