use addon_service::{commands, config::Settings, SERVICE_NAME};
use clap::Parser;
use service_core::observability::init_tracing;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "addon-service",
    about = "Installs addons and provisions OAuth client credentials for them",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Install an addon package and hand it fresh credentials
    Install {
        /// Addon name, without the package prefix
        addon: String,
        /// npm registry URL
        #[arg(short, long)]
        registry: Option<String>,
        /// Port the authorization service is running on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run the authorization service
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let settings = Settings::load()?;

    init_tracing(
        SERVICE_NAME,
        &settings.log_level,
        settings.otlp_endpoint.as_deref(),
        settings.log_json,
    )?;

    match cli.command {
        Commands::Install {
            addon,
            registry,
            port,
        } => {
            let registry = registry.unwrap_or_else(|| settings.registry_url.clone());
            let port = port.unwrap_or(settings.port);
            commands::install::run(&settings, &addon, &registry, port).await
        }
        Commands::Serve { port } => {
            commands::serve::run(&settings, port.unwrap_or(settings.port)).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
