//! Local package installation through an external package manager.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::instrument;

use super::stage::StageError;

#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Install the latest version of `package` from `registry`.
    async fn install(&self, package: &str, registry: &str) -> Result<(), StageError>;

    /// Read the manifest of an installed package.
    async fn metadata(&self, package: &str) -> Result<Value, StageError>;
}

/// Runs `<program> install <package>@latest --registry=<registry>`.
///
/// Any output on stderr fails the install, even when the process exits
/// successfully.
#[derive(Debug, Clone)]
pub struct NpmInstaller {
    program: String,
    working_dir: PathBuf,
}

impl NpmInstaller {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            working_dir: working_dir.into(),
        }
    }

    pub fn manifest_path(&self, package: &str) -> PathBuf {
        manifest_path(&self.working_dir, package)
    }
}

fn manifest_path(root: &Path, package: &str) -> PathBuf {
    root.join("node_modules").join(package).join("package.json")
}

#[async_trait]
impl PackageInstaller for NpmInstaller {
    #[instrument(skip(self), fields(program = %self.program))]
    async fn install(&self, package: &str, registry: &str) -> Result<(), StageError> {
        let output = Command::new(&self.program)
            .arg("install")
            .arg(format!("{}@latest", package))
            .arg(format!("--registry={}", registry))
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| StageError::Install(format!("failed to run {}: {}", self.program, e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            tracing::warn!(stderr = %stderr.trim_end(), "Package manager wrote to stderr");
            return Err(StageError::Install(stderr.trim_end().to_string()));
        }

        if !output.status.success() {
            return Err(StageError::Install(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        tracing::info!("Package installed");
        Ok(())
    }

    async fn metadata(&self, package: &str) -> Result<Value, StageError> {
        let path = self.manifest_path(package);
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            StageError::Install(format!("cannot read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            StageError::Install(format!("invalid manifest {}: {}", path.display(), e))
        })
    }
}
