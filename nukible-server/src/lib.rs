use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::app::create_app;
use crate::configs::Settings;
use crate::devices::{DeviceDriver, DeviceRegistry, LockDevice};
use crate::services::PairingService;

pub mod app;
pub mod configs;
pub mod devices;
pub mod errors;
pub mod handles;
pub mod middlewares;
pub mod services;

/// Scanner shutdown budget; a hung adapter must not block process exit.
const STOP_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run(driver: Arc<dyn DeviceDriver>) -> anyhow::Result<()> {
    let config_dir = Settings::config_dir();
    let mut settings =
        Settings::load_or_init(&config_dir).context("could not load configuration")?;

    if settings.smartlock.is_empty() {
        let pairing = PairingService::new(driver.clone());
        pairing
            .bootstrap(&mut settings)
            .await
            .context("pairing bootstrap failed")?;
        settings
            .persist(&config_dir)
            .context("could not write configuration")?;
        tracing::info!(
            path = %config_dir.join(configs::CONF_FILE_NAME).display(),
            "configuration written"
        );
    }

    let settings = Arc::new(settings);
    let registry = Arc::new(DeviceRegistry::new(driver.scanner()));
    for config in &settings.smartlock {
        let link = driver.open(config);
        registry
            .register(Arc::new(LockDevice::new(config.clone(), link)))
            .await;
    }

    let app = create_app(&settings, registry.clone()).await;

    registry
        .start_scanning()
        .await
        .context("could not start scanning")?;

    let ip_addr = settings
        .server
        .host
        .parse::<IpAddr>()
        .context("invalid server host")?;
    let address = SocketAddr::from((ip_addr, settings.server.port));
    let listener = TcpListener::bind(&address)
        .await
        .context("could not bind server address")?;

    tracing::info!("listening on {:?}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server stopped unexpectedly")?;

    registry.stop_scanning(STOP_SCAN_TIMEOUT).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "could not listen for the shutdown signal");
    }
}
