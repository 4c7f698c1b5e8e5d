//! Reboot Agent
//!
//! Per-node daemon that executes approved reboots. It watches exactly one
//! node — its own, identified by `NODE_NAME` and filtered server-side — and
//! reacts to two annotation states: `reboot` (approved) makes it durably
//! record `reboot-in-progress` and then invoke the host reboot primitive;
//! `reboot-in-progress` seen on a later delivery means the node restarted,
//! so the marker is cleared.
//!
//! The node is rebooted as-is: no workload draining or cordoning happens
//! first.

mod agent;
mod error;
mod reboot;
mod reconciler;

use std::env;
use std::time::Duration;

use tracing::info;

use crate::agent::Agent;
use crate::error::AgentError;

const NODE_NAME_ENV: &str = "NODE_NAME";
const DEFAULT_RESYNC_SECONDS: u64 = 60;
const DEFAULT_REBOOT_COMMAND: &str = "systemctl reboot";

#[tokio::main]
async fn main() -> Result<(), AgentError> {
    tracing_subscriber::fmt::init();

    info!("Starting Reboot Agent");

    // The node name identifies "self"; in-cluster it is injected via the pod
    // downward API, and it can be set manually during testing.
    let node_name = env::var(NODE_NAME_ENV).map_err(|_| {
        AgentError::InvalidConfig(format!("{NODE_NAME_ENV} environment variable is required"))
    })?;
    let resync_seconds: u64 = match env::var("RESYNC_SECONDS") {
        Ok(raw) => raw.parse().map_err(|_| {
            AgentError::InvalidConfig(format!("RESYNC_SECONDS is not valid: {raw}"))
        })?,
        Err(_) => DEFAULT_RESYNC_SECONDS,
    };
    let reboot_command =
        env::var("REBOOT_COMMAND").unwrap_or_else(|_| DEFAULT_REBOOT_COMMAND.to_string());

    info!("Configuration:");
    info!("  Node name: {node_name}");
    info!("  Resync period: {resync_seconds}s");
    info!("  Reboot command: {reboot_command}");

    let agent = Agent::new(
        node_name,
        Duration::from_secs(resync_seconds),
        &reboot_command,
    )
    .await?;
    agent.run().await
}
