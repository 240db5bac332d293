use std::sync::Arc;

use nukible_server::devices::{SimulatedDriver, SimulatedLock};
use nukible_server::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let app_name = env!("CARGO_PKG_NAME").replace('-', "_");

                format!("{app_name}=info,tower_http=info").into()
            }),
        )
        .init();

    // Virtual bridge: one simulated lock stands in for the wireless side so
    // the whole lifecycle (pairing, scanning, HTTP) runs without hardware.
    // A real adapter plugs in through the same `DeviceDriver` seam.
    let driver = Arc::new(SimulatedDriver::new());
    driver.add_lock(Arc::new(
        SimulatedLock::new("54:D2:72:4F:6E:81").with_pin(1234),
    ));

    run(driver).await
}
