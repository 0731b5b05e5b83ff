//! Addon installation pipeline and its collaborators.

pub mod auth_client;
pub mod delivery;
pub mod installer;
mod orchestrator;
pub mod progress;
pub mod registry;
mod stage;

pub use auth_client::{AuthServiceClient, ClientRegistrar, TokenMinter, SHARED_SECRET_PARAM};
pub use delivery::{HttpTokenDeliverer, TokenDeliverer};
pub use installer::{NpmInstaller, PackageInstaller};
pub use orchestrator::{InstallRequest, Installation, Orchestrator, PACKAGE_PREFIX};
pub use progress::{ProgressEvent, ProgressLog, ProgressObserver};
pub use registry::{package_url, HttpRegistryProber, RegistryProber};
pub use stage::{post_client, HttpError, PipelineError, PipelineState, Stage, StageError};
