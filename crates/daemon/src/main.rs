//! Vigil - Main Entry Point
//! Resource-aware supervisor for local projects

mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vigil_core::application::{shutdown_channel, Supervisor};
use vigil_core::config::SupervisorConfig;
use vigil_core::port::NoopHooks;
use vigil_infra_system::{
    SystemMemoryProbe, SystemProcessScanner, SystemProjectLauncher, SystemTreeTerminator,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_CONFIG_NAME: &str = "vigil";
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Load configuration.
///
/// An explicit `VIGIL_CONFIG` path is strict: a missing file is a hard
/// error. The default `vigil.{yaml,toml,json}` in the working directory
/// is permissive: absent means empty defaults.
fn load_config() -> Result<SupervisorConfig> {
    let builder = match std::env::var("VIGIL_CONFIG") {
        Ok(path) => {
            let path = shellexpand::tilde(&path).into_owned();
            config::Config::builder()
                .add_source(config::File::from(std::path::Path::new(&path)))
        }
        Err(_) => config::Config::builder()
            .add_source(config::File::with_name(DEFAULT_CONFIG_NAME).required(false)),
    };

    builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize::<SupervisorConfig>()
        .context("Invalid configuration")
}

fn init_logging(config: &SupervisorConfig) {
    let log_format = std::env::var("VIGIL_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let fallback = config
        .log_level
        .clone()
        .map(|level| format!("vigil={level}"))
        .unwrap_or_else(|| "vigil=info".to_string());
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration (strict vs permissive, see load_config)
    let config = load_config()?;

    // 2. Initialize logging
    init_logging(&config);
    info!("Vigil v{} starting...", VERSION);

    // 2.1. Initialize OpenTelemetry (optional)
    if let Err(e) = telemetry::init_telemetry() {
        warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
    }

    if config.projects.is_empty() {
        warn!("No projects configured; nothing to supervise once the loop starts");
    }

    // 3. Setup dependencies (DI wiring)
    let scanner = Arc::new(SystemProcessScanner::new());
    let memory_probe = Arc::new(SystemMemoryProbe::new());
    let launcher = Arc::new(SystemProjectLauncher::new());
    let terminator = Arc::new(SystemTreeTerminator::new());

    let mut supervisor = Supervisor::from_config(
        &config,
        scanner,
        memory_probe,
        launcher,
        terminator,
        Arc::new(NoopHooks),
    )
    .context("Invalid supervisor configuration")?;

    // 4. Run the supervisor loop
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let mut supervisor_handle = tokio::spawn(async move { supervisor.run(shutdown_rx).await });

    info!("Supervision active. Press Ctrl+C to shutdown");

    // 5. Wait for a shutdown signal or an unprompted supervisor exit
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Terminating supervised projects...");
            shutdown_tx.shutdown();
            match tokio::time::timeout(SHUTDOWN_JOIN_TIMEOUT, &mut supervisor_handle).await {
                Ok(Ok(result)) => {
                    if let Err(e) = result {
                        error!(error = %e, "Supervisor finished with an error during shutdown");
                    }
                }
                Ok(Err(e)) => error!(error = %e, "Supervisor task failed during shutdown"),
                Err(_) => warn!("Supervisor did not stop in time; exiting anyway"),
            }
        }
        result = &mut supervisor_handle => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(error = %e, "Supervision ended");
                    anyhow::bail!("vigil stopped: {e}");
                }
                Err(e) => anyhow::bail!("supervisor task failed: {e}"),
            }
        }
    }

    info!("Shutdown complete.");
    Ok(())
}
