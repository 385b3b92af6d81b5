//! Console front end
//!
//! A line-oriented stand-in for a chat bot: each line is a command issued
//! by the configured operator. Wakes run on their own tasks, so repeating
//! a wake while one is pending joins the pending attempt.

use crate::wake::{WakeResult, WakeService};
use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, error, info};
use wakeon_shared::OperatorId;

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    /// `wake` without a device: offer the choices
    List,
    Wake(String),
    Quit,
    Unknown(String),
}

impl ConsoleCommand {
    /// Parse a line; a leading `/` is accepted as in chat commands
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let line = line.strip_prefix('/').unwrap_or(line);
        let mut parts = line.split_whitespace();
        let command = parts.next()?;
        let argument = parts.next();

        let parsed = match (command, argument) {
            ("start" | "help", None) => ConsoleCommand::Start,
            ("wake" | "devices", None) => ConsoleCommand::List,
            ("wake", Some(device)) if parts.next().is_none() => {
                ConsoleCommand::Wake(device.to_string())
            }
            ("quit" | "exit", None) => ConsoleCommand::Quit,
            _ => ConsoleCommand::Unknown(line.to_string()),
        };
        Some(parsed)
    }
}

/// Greeting for `start`
pub fn welcome(service: &WakeService, operator: &OperatorId) -> String {
    if service.is_authorized(operator) {
        "Welcome! Use the wake command to wake up a device.".into()
    } else {
        "You are not authorized to use this bot.".into()
    }
}

/// Device menu for `wake` without arguments
pub fn device_menu(service: &WakeService, operator: &OperatorId) -> String {
    if !service.is_authorized(operator) {
        return WakeResult::Unauthorized.to_string();
    }

    let mut menu = String::from("Select the device to wake up:");
    for name in service.list_device_names() {
        menu.push_str("\n  wake ");
        menu.push_str(&name);
    }
    menu
}

/// Acknowledgement printed while a wake is pending
///
/// Only requests that will actually start or join an attempt get one.
pub fn wake_ack(service: &WakeService, operator: &OperatorId, device: &str) -> Option<String> {
    if service.is_authorized(operator) && service.has_device(device) {
        Some(format!("Waking {}. Checking status...", device))
    } else {
        None
    }
}

/// Read commands from stdin until `quit` or end of input
pub async fn run_console(service: Arc<WakeService>, operator: OperatorId) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut wakes = JoinSet::new();

    println!("{}", welcome(&service, &operator));

    while let Some(line) = lines.next_line().await? {
        // Reap finished wakes so the set does not grow unbounded
        while let Some(done) = wakes.try_join_next() {
            if let Err(e) = done {
                error!("Wake task failed: {}", e);
            }
        }

        let Some(command) = ConsoleCommand::parse(&line) else {
            continue;
        };
        debug!("Console command: {:?}", command);

        match command {
            ConsoleCommand::Start => println!("{}", welcome(&service, &operator)),
            ConsoleCommand::List => println!("{}", device_menu(&service, &operator)),
            ConsoleCommand::Wake(device) => {
                if let Some(ack) = wake_ack(&service, &operator, &device) {
                    println!("{}", ack);
                }
                let service = service.clone();
                let operator = operator.clone();
                wakes.spawn(async move {
                    let result = service.request_wake(&operator, &device).await;
                    println!("{}", result);
                });
            }
            ConsoleCommand::Quit => break,
            ConsoleCommand::Unknown(text) => {
                println!("Unknown command '{}'. Try start, wake or quit.", text)
            }
        }
    }

    // Attempts cannot be cancelled; wait for their verdicts
    let pending = service.orchestrator().in_flight().await;
    if pending > 0 {
        info!("Waiting for {} wake attempt(s) to finish", pending);
    }
    while let Some(done) = wakes.join_next().await {
        if let Err(e) = done {
            error!("Wake task failed: {}", e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AuthorizationGate;
    use crate::wake::testing::{registry, CountingSignal, ScriptedProbe};
    use crate::wake::{PollPolicy, WakeOrchestrator};

    fn service() -> WakeService {
        let orchestrator = WakeOrchestrator::new(
            registry(&["pc_home", "server_office"]),
            CountingSignal::new(),
            ScriptedProbe::new(&[]),
            PollPolicy::default(),
        );
        WakeService::new(AuthorizationGate::new([OperatorId::from(42)]), orchestrator)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ConsoleCommand::parse("  "), None);
        assert_eq!(ConsoleCommand::parse("/start"), Some(ConsoleCommand::Start));
        assert_eq!(ConsoleCommand::parse("wake"), Some(ConsoleCommand::List));
        assert_eq!(
            ConsoleCommand::parse("/wake pc_home"),
            Some(ConsoleCommand::Wake("pc_home".into()))
        );
        assert_eq!(ConsoleCommand::parse("exit"), Some(ConsoleCommand::Quit));
        assert_eq!(
            ConsoleCommand::parse("wake a b"),
            Some(ConsoleCommand::Unknown("wake a b".into()))
        );
    }

    #[test]
    fn test_menu_respects_authorization() {
        let service = service();

        let menu = device_menu(&service, &OperatorId::from(42));
        assert_eq!(
            menu,
            "Select the device to wake up:\n  wake pc_home\n  wake server_office"
        );
        assert_eq!(device_menu(&service, &OperatorId::from(7)), "Access denied.");

        assert!(welcome(&service, &OperatorId::from(42)).starts_with("Welcome"));
        assert_eq!(
            welcome(&service, &OperatorId::from(7)),
            "You are not authorized to use this bot."
        );
    }

    #[test]
    fn test_ack_only_for_known_devices() {
        let service = service();
        let operator = OperatorId::from(42);

        assert_eq!(
            wake_ack(&service, &operator, "pc_home").as_deref(),
            Some("Waking pc_home. Checking status...")
        );
        assert_eq!(wake_ack(&service, &operator, "nas"), None);
        assert_eq!(wake_ack(&service, &OperatorId::from(7), "pc_home"), None);
    }
}
