//! Shared helpers for addon-service integration tests.

#![allow(dead_code)]

use addon_service::models::TokenLifetimes;
use addon_service::pipeline::{
    post_client, AuthServiceClient, HttpRegistryProber, HttpTokenDeliverer, Orchestrator,
    PackageInstaller, StageError,
};
use addon_service::services::{ClientService, MemoryStore};
use addon_service::{build_router, AppState};
use async_trait::async_trait;
use reqwest::Url;
use secrecy::Secret;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const SHARED_SECRET: &str = "test-shared-secret";
pub const BILLING_EMAIL: &str = "a@b.com";

pub fn test_state() -> AppState {
    let clients = ClientService::new(Arc::new(MemoryStore::new()), TokenLifetimes::default());
    AppState::new(clients, Secret::new(SHARED_SECRET.to_string()))
}

/// Authorization service running on an ephemeral port.
pub struct TestAuthService {
    pub base_url: Url,
    pub state: AppState,
}

impl TestAuthService {
    pub async fn spawn() -> Self {
        let state = test_state();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: Url::parse(&format!("http://{}/", addr)).unwrap(),
            state,
        }
    }

    pub fn client(&self) -> AuthServiceClient {
        AuthServiceClient::new(
            post_client().unwrap(),
            self.base_url.clone(),
            Secret::new(SHARED_SECRET.to_string()),
        )
    }
}

/// Installer that records calls and serves a fixed manifest.
pub struct FakeInstaller {
    pub manifest: Value,
    pub installed: Mutex<Vec<String>>,
}

impl FakeInstaller {
    pub fn new(manifest: Value) -> Arc<Self> {
        Arc::new(Self {
            manifest,
            installed: Mutex::new(Vec::new()),
        })
    }

    pub fn installed(&self) -> Vec<String> {
        self.installed.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageInstaller for FakeInstaller {
    async fn install(&self, package: &str, _registry: &str) -> Result<(), StageError> {
        self.installed.lock().unwrap().push(package.to_string());
        Ok(())
    }

    async fn metadata(&self, _package: &str) -> Result<Value, StageError> {
        Ok(self.manifest.clone())
    }
}

/// Orchestrator wired to real HTTP collaborators and the given installer.
pub fn orchestrator(
    auth: &TestAuthService,
    installer: Arc<dyn PackageInstaller>,
) -> Orchestrator {
    let auth_client = Arc::new(auth.client());
    Orchestrator::new(
        Arc::new(HttpRegistryProber::default()),
        installer,
        auth_client.clone(),
        auth_client,
        Arc::new(HttpTokenDeliverer::new(post_client().unwrap())),
        BILLING_EMAIL,
    )
}
