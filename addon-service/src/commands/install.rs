use anyhow::Context;
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::Settings;
use crate::pipeline::{
    post_client, AuthServiceClient, HttpRegistryProber, HttpTokenDeliverer, InstallRequest,
    NpmInstaller, Orchestrator, ProgressEvent, ProgressObserver, Stage,
};

/// Prints one line per finished stage to stdout.
pub struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn report(&self, addon: &str, event: ProgressEvent) {
        if let Some(line) = progress_line(addon, event) {
            println!("{}", line);
        }
    }
}

pub fn progress_line(addon: &str, event: ProgressEvent) -> Option<String> {
    let line = match event {
        ProgressEvent::Started(Stage::Installing) => {
            format!("running npm install for {} …", addon)
        }
        ProgressEvent::Completed(Stage::Probing) => format!("✔ found addon \"{}\"", addon),
        ProgressEvent::Completed(Stage::Installing) => {
            format!("✔ installed addon \"{}\"", addon)
        }
        ProgressEvent::Completed(Stage::Registering) => {
            format!("✔ generated client for \"{}\"", addon)
        }
        ProgressEvent::Completed(Stage::Minting) => {
            format!("✔ generated access token for \"{}\"", addon)
        }
        ProgressEvent::Done => format!("\\o/ addon \"{}\" successfully installed", addon),
        _ => return None,
    };
    Some(line)
}

/// Wire the pipeline against the real registry, package manager, authorization
/// service on `port` and addon callbacks.
pub fn build_orchestrator(settings: &Settings, port: u16) -> anyhow::Result<Orchestrator> {
    // Registry lookups may follow redirects, the POST stages must not
    let http = post_client()?;

    let auth = Arc::new(AuthServiceClient::new(
        http.clone(),
        settings.auth_base_url(port)?,
        settings.require_shared_secret()?,
    ));

    Ok(Orchestrator::new(
        Arc::new(HttpRegistryProber::new(reqwest::Client::new())),
        Arc::new(NpmInstaller::new(
            settings.installer.program.clone(),
            settings.installer.working_dir.clone(),
        )),
        auth.clone(),
        auth,
        Arc::new(HttpTokenDeliverer::new(http)),
        settings.require_billing_email()?,
    ))
}

pub async fn run(
    settings: &Settings,
    addon: &str,
    registry: &str,
    port: u16,
) -> anyhow::Result<ExitCode> {
    let orchestrator =
        build_orchestrator(settings, port).context("Failed to configure the installer")?;
    let request = InstallRequest::new(addon, &settings.package_prefix, registry);

    match orchestrator.run(&request, &ConsoleProgress).await {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("✖ {}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lines() {
        assert_eq!(
            progress_line("weather", ProgressEvent::Completed(Stage::Probing)).as_deref(),
            Some("✔ found addon \"weather\"")
        );
        assert_eq!(
            progress_line("weather", ProgressEvent::Done).as_deref(),
            Some("\\o/ addon \"weather\" successfully installed")
        );
        assert!(progress_line("weather", ProgressEvent::Started(Stage::Probing)).is_none());
        assert!(progress_line("weather", ProgressEvent::Failed(Stage::Minting)).is_none());
    }

    #[test]
    fn test_build_requires_secrets() {
        let settings: Settings = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(build_orchestrator(&settings, 8084).is_err());

        let settings: Settings = serde_json::from_value(serde_json::json!({
            "shared_fetch_secret": "s3cret",
            "billing_email": "a@b.com"
        }))
        .unwrap();
        assert!(build_orchestrator(&settings, 8084).is_ok());
    }
}
