//! The host reboot primitive.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::error::AgentError;

/// Opaque "reboot now" primitive supplied by the host.
///
/// On success the machine restarts, so the call is not expected to return in
/// any meaningful way; the caller treats a successful return as "the reboot
/// is under way" and exits.
#[async_trait]
pub trait Rebooter: Send + Sync {
    /// Triggers an immediate host reboot.
    async fn reboot_now(&self) -> Result<(), AgentError>;
}

/// Reboots by running a host command (`systemctl reboot` by default).
pub struct CommandRebooter {
    program: String,
    args: Vec<String>,
}

impl CommandRebooter {
    /// Parses a whitespace-separated command line.
    pub fn new(command_line: &str) -> Result<Self, AgentError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let Some(program) = parts.next() else {
            return Err(AgentError::InvalidConfig(
                "reboot command is empty".to_string(),
            ));
        };
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl Rebooter for CommandRebooter {
    async fn reboot_now(&self) -> Result<(), AgentError> {
        info!("invoking host reboot: {} {}", self.program, self.args.join(" "));
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .await
            .map_err(|e| AgentError::Reboot(format!("failed to run {}: {e}", self.program)))?;
        if status.success() {
            Ok(())
        } else {
            Err(AgentError::Reboot(format!(
                "{} exited with {status}",
                self.program
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_program_and_arguments() {
        let rebooter = CommandRebooter::new("systemctl reboot").expect("parse");
        assert_eq!(rebooter.program, "systemctl");
        assert_eq!(rebooter.args, vec!["reboot"]);
    }

    #[test]
    fn rejects_an_empty_command() {
        assert!(matches!(
            CommandRebooter::new("   "),
            Err(AgentError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn failing_command_surfaces_a_reboot_error() {
        let rebooter = CommandRebooter::new("false").expect("parse");
        assert!(matches!(
            rebooter.reboot_now().await,
            Err(AgentError::Reboot(_))
        ));
    }

    #[tokio::test]
    async fn successful_command_returns_ok() {
        let rebooter = CommandRebooter::new("true").expect("parse");
        assert!(rebooter.reboot_now().await.is_ok());
    }
}
