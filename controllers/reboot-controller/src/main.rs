//! Reboot Controller
//!
//! Cluster-scope control loop that throttles node reboots. External actors
//! mark nodes with the `reboot-needed` annotation; this controller watches
//! every node, recomputes the cluster's unavailability count on each event,
//! and approves pending requests while the count stays under the configured
//! `MAX_UNAVAILABLE` budget. The per-node reboot agent does the rest.

mod controller;
mod error;
mod reconciler;

use std::env;
use std::time::Duration;

use tracing::info;

use crate::controller::Controller;
use crate::error::ControllerError;

const DEFAULT_MAX_UNAVAILABLE: usize = 1;
const DEFAULT_RESYNC_SECONDS: u64 = 60;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ControllerError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ControllerError::InvalidConfig(format!("{name} is not valid: {raw}"))),
        Err(_) => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt::init();

    info!("Starting Reboot Controller");

    // Load configuration from environment variables
    let max_unavailable: usize = env_or("MAX_UNAVAILABLE", DEFAULT_MAX_UNAVAILABLE)?;
    let resync_seconds: u64 = env_or("RESYNC_SECONDS", DEFAULT_RESYNC_SECONDS)?;

    info!("Configuration:");
    info!("  Max unavailable nodes: {max_unavailable}");
    info!("  Resync period: {resync_seconds}s");

    // Initialize and run controller
    let controller =
        Controller::new(max_unavailable, Duration::from_secs(resync_seconds)).await?;
    controller.run().await
}
