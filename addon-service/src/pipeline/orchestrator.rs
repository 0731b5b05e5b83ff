//! Sequential installation pipeline.
//!
//! A run looks the package up in the registry, installs it, registers an
//! OAuth client from the package manifest, mints a token for the billing
//! identity and delivers it to the addon's callback. Each stage only starts
//! after the previous one succeeded; the first failure ends the run.

use std::future::Future;
use std::sync::Arc;
use tracing::instrument;

use super::auth_client::{ClientRegistrar, TokenMinter};
use super::delivery::TokenDeliverer;
use super::installer::PackageInstaller;
use super::progress::{ProgressEvent, ProgressObserver};
use super::registry::RegistryProber;
use super::stage::{PipelineError, Stage, StageError};
use crate::models::{Client, Token};

/// Package names are the addon name with this prefix.
pub const PACKAGE_PREFIX: &str = "npm-addon-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub addon: String,
    pub package: String,
    pub registry: String,
}

impl InstallRequest {
    pub fn new(addon: &str, prefix: &str, registry: &str) -> Self {
        Self {
            addon: addon.to_string(),
            package: format!("{}{}", prefix, addon),
            registry: registry.to_string(),
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Installation {
    pub addon: String,
    pub package: String,
    pub client: Client,
    pub token: Token,
}

#[derive(Clone)]
pub struct Orchestrator {
    prober: Arc<dyn RegistryProber>,
    installer: Arc<dyn PackageInstaller>,
    registrar: Arc<dyn ClientRegistrar>,
    minter: Arc<dyn TokenMinter>,
    deliverer: Arc<dyn TokenDeliverer>,
    billing_email: String,
}

impl Orchestrator {
    pub fn new(
        prober: Arc<dyn RegistryProber>,
        installer: Arc<dyn PackageInstaller>,
        registrar: Arc<dyn ClientRegistrar>,
        minter: Arc<dyn TokenMinter>,
        deliverer: Arc<dyn TokenDeliverer>,
        billing_email: impl Into<String>,
    ) -> Self {
        Self {
            prober,
            installer,
            registrar,
            minter,
            deliverer,
            billing_email: billing_email.into(),
        }
    }

    #[instrument(skip(self, progress), fields(addon = %request.addon, package = %request.package))]
    pub async fn run(
        &self,
        request: &InstallRequest,
        progress: &dyn ProgressObserver,
    ) -> Result<Installation, PipelineError> {
        let run = Run { request, progress };

        run.step(
            Stage::Probing,
            self.prober.exists(&request.package, &request.registry),
        )
        .await?;

        let metadata = run
            .step(Stage::Installing, async {
                self.installer
                    .install(&request.package, &request.registry)
                    .await?;
                self.installer.metadata(&request.package).await
            })
            .await?;

        let client = run
            .step(Stage::Registering, self.registrar.create_client(&metadata))
            .await?;

        let token = run
            .step(
                Stage::Minting,
                self.minter.create_token(&client, &self.billing_email),
            )
            .await?;

        run.step(Stage::Delivering, self.deliverer.deliver(&client, &token))
            .await?;

        progress.report(&request.addon, ProgressEvent::Done);
        tracing::info!(client_id = %client.client_id, "Addon installed");

        Ok(Installation {
            addon: request.addon.clone(),
            package: request.package.clone(),
            client,
            token,
        })
    }
}

struct Run<'a> {
    request: &'a InstallRequest,
    progress: &'a dyn ProgressObserver,
}

impl Run<'_> {
    /// Await `action` between a start and a completion or failure event.
    /// `action` is lazy, so nothing runs before the start event.
    async fn step<T>(
        &self,
        stage: Stage,
        action: impl Future<Output = Result<T, StageError>>,
    ) -> Result<T, PipelineError> {
        let addon = &self.request.addon;
        self.progress.report(addon, ProgressEvent::Started(stage));

        match action.await {
            Ok(value) => {
                self.progress.report(addon, ProgressEvent::Completed(stage));
                Ok(value)
            }
            Err(cause) => {
                tracing::error!(stage = %stage, error = %cause, "Installation step failed");
                self.progress.report(addon, ProgressEvent::Failed(stage));
                Err(PipelineError::new(
                    stage,
                    addon,
                    &self.request.registry,
                    cause,
                ))
            }
        }
    }
}
