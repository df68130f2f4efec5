//! # Operator Commands
//!
//! Lines typed by the operator that start with `.esdata`. The relay answers
//! with a message for the host to display, or `None` if the line is not one of
//! its commands so the host can offer it to other handlers.

use crate::model::HostSession;
use crate::relay::Relay;

/// Prefix every command starts with.
pub const COMMAND_PREFIX: &str = ".esdata";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Toggle recording of flight plans not tracked by the operator.
    UpdateAll,
    /// Toggle debug messages.
    Debug,
    /// Show the operator's own position.
    WhoAmI,
    /// Show relay state, pending entities and the last send error.
    Status,
}

impl Command {
    /// Parses a command line. Case-insensitive, surrounding whitespace ignored.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        if !words.next()?.eq_ignore_ascii_case(COMMAND_PREFIX) {
            return None;
        }
        let command = match words.next()?.to_ascii_lowercase().as_str() {
            "updateall" => Command::UpdateAll,
            "debug" => Command::Debug,
            "whoami" => Command::WhoAmI,
            "status" => Command::Status,
            _ => return None,
        };
        words.next().is_none().then_some(command)
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}

impl Relay {
    /// Handles one operator command line.
    pub fn on_command(&mut self, line: &str, host: &dyn HostSession) -> Option<String> {
        let command = Command::parse(line)?;
        let reply = match command {
            Command::UpdateAll => {
                let state = self.state_mut();
                state.update_all = !state.update_all;
                format!("Update all mode {}", on_off(state.update_all))
            }
            Command::Debug => {
                let state = self.state_mut();
                state.debug = !state.debug;
                format!("Debug mode {}", on_off(state.debug))
            }
            Command::WhoAmI => match host.controller_myself() {
                Some(me) => format!(
                    "{} ({}) on {:.3}, controller: {}",
                    me.callsign,
                    me.name,
                    me.frequency,
                    if me.is_controller { "yes" } else { "no" }
                ),
                None => "Not connected".to_string(),
            },
            Command::Status => format!(
                "Relay {}, {} entities pending, update all {}, debug {}, last error: {}",
                if self.is_enabled() { "enabled" } else { "disabled" },
                self.pending_entities(),
                on_off(self.state().update_all),
                on_off(self.state().debug),
                self.last_error().as_deref().unwrap_or("none")
            ),
        };
        log::info!("{}", reply);
        Some(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::RelayConfig;
    use crate::error::RelayError;
    use crate::model::{ConnectionType, ControllerSnapshot, RunwayActivity};
    use crate::retrieve::Transport;
    use futures_util::FutureExt;
    use futures_util::future::BoxFuture;
    use std::sync::Arc;
    use tokio::runtime::Handle;

    struct Discard;

    impl Transport for Discard {
        fn post_json(&self, _body: Vec<u8>) -> BoxFuture<'static, Result<(), RelayError>> {
            async { Ok(()) }.boxed()
        }

        fn endpoint(&self) -> &str {
            "mock://discard"
        }
    }

    struct Host(Option<ControllerSnapshot>);

    impl HostSession for Host {
        fn connection_type(&self) -> ConnectionType {
            ConnectionType::Direct
        }
        fn controller_myself(&self) -> Option<ControllerSnapshot> {
            self.0.clone()
        }
        fn runway_activity(&self) -> Vec<RunwayActivity> {
            Vec::new()
        }
    }

    fn relay() -> Relay {
        Relay::new(RelayConfig::default(), Arc::new(Discard), Handle::current())
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse(".esdata updateall"), Some(Command::UpdateAll));
        assert_eq!(Command::parse("  .ESDATA  Debug "), Some(Command::Debug));
        assert_eq!(Command::parse(".esdata whoami"), Some(Command::WhoAmI));
        assert_eq!(Command::parse(".esdata status"), Some(Command::Status));
        assert_eq!(Command::parse(".esdata"), None);
        assert_eq!(Command::parse(".esdata reboot"), None);
        assert_eq!(Command::parse(".esdata debug now"), None);
        assert_eq!(Command::parse(".other debug"), None);
    }

    #[tokio::test]
    async fn toggles_flip_state() {
        let mut relay = relay();
        let host = Host(None);

        assert_eq!(
            relay.on_command(".esdata updateall", &host).as_deref(),
            Some("Update all mode ON")
        );
        assert!(relay.state().update_all);
        assert_eq!(
            relay.on_command(".esdata updateall", &host).as_deref(),
            Some("Update all mode OFF")
        );

        relay.on_command(".esdata debug", &host);
        assert!(relay.state().debug);
    }

    #[tokio::test]
    async fn whoami_reports_own_position() {
        let mut relay = relay();
        let host = Host(Some(ControllerSnapshot {
            callsign: "ESSA_TWR".into(),
            name: "Jane Doe".into(),
            frequency: 118.505,
            is_controller: true,
        }));
        let reply = relay.on_command(".esdata whoami", &host).unwrap();
        assert_eq!(reply, "ESSA_TWR (Jane Doe) on 118.505, controller: yes");
        assert_eq!(relay.pending_entities(), 0);

        assert_eq!(
            relay.on_command(".esdata whoami", &Host(None)).as_deref(),
            Some("Not connected")
        );
    }

    #[tokio::test]
    async fn status_and_unknown_lines() {
        let mut relay = relay();
        let host = Host(None);
        let status = relay.on_command(".esdata status", &host).unwrap();
        assert!(status.starts_with("Relay disabled, 0 entities pending"));
        assert!(status.ends_with("last error: none"));

        assert!(relay.on_command("hello", &host).is_none());
    }
}
