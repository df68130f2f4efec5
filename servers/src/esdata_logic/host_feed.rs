//! # Host Feed
//!
//! The replay host behind `server_esdata`. Host callbacks arrive as one JSON
//! object per line, tagged by `type`:
//!
//! ```text
//! {"type":"connection","connection":"direct"}
//! {"type":"controller","callsign":"ESSA_TWR","name":"Jane Doe","frequency":118.505,"isController":true}
//! {"type":"runways","runways":[{"airport":"ESSA","runway":"19L","arrival":false,"departure":true}]}
//! {"type":"wait","secs":10}
//! {"type":"assigned","plan":{"callsign":"SAS123","valid":true,"trackedByMe":true,"origin":"ESSA"},"data":{"kind":"heading","value":270}}
//! {"type":"command","line":".esdata status"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use lib_esdata::{
    AssignedData, ConnectionType, ControllerSnapshot, FlightPlan, HostSession, Relay,
    RunwayActivity,
};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, BufReader};

/// One host callback.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// Flight plan (route) data changed.
    FlightPlan(FlightPlan),
    /// A controller changed assigned data.
    Assigned { plan: FlightPlan, data: AssignedData },
    /// A flight plan left the network.
    Disconnect(FlightPlan),
    /// The host's network connection changed.
    Connection { connection: ConnectionType },
    /// The operator's own position changed.
    Controller(ControllerSnapshot),
    /// The active runway configuration changed.
    Runways { runways: Vec<RunwayActivity> },
    /// An operator command line.
    Command { line: String },
    /// Hold back the following lines, ticks keep running.
    Wait { secs: u64 },
}

/// Parses one feed line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<HostEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Opens `path`, or stdin when there is none.
pub async fn open_input(path: Option<&Path>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open host feed {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

/// Session state the relay queries on every tick, kept from the latest
/// `connection`, `controller` and `runways` events.
#[derive(Debug, Clone, Default)]
pub struct ReplayHost {
    connection: ConnectionType,
    me: Option<ControllerSnapshot>,
    runways: Vec<RunwayActivity>,
}

impl HostSession for ReplayHost {
    fn connection_type(&self) -> ConnectionType {
        self.connection
    }

    fn controller_myself(&self) -> Option<ControllerSnapshot> {
        self.me.clone()
    }

    fn runway_activity(&self) -> Vec<RunwayActivity> {
        self.runways.clone()
    }
}

impl ReplayHost {
    /// Feeds one event to `relay`. Returns how long to hold back the feed.
    pub fn apply(&mut self, event: HostEvent, relay: &mut Relay) -> Option<Duration> {
        match event {
            HostEvent::FlightPlan(fp) => relay.on_flight_plan_data_update(&fp),
            HostEvent::Assigned { plan, data } => {
                relay.on_controller_assigned_data_update(&plan, &data)
            }
            HostEvent::Disconnect(fp) => relay.on_flight_plan_disconnect(&fp),
            HostEvent::Connection { connection } => {
                log::info!("Host connection: {:?}", connection);
                self.connection = connection;
            }
            HostEvent::Controller(me) => self.me = Some(me),
            HostEvent::Runways { runways } => self.runways = runways,
            HostEvent::Command { line } => {
                if relay.on_command(&line, &*self).is_none() {
                    log::warn!("Unknown command: {}", line);
                }
            }
            HostEvent::Wait { secs } => return Some(Duration::from_secs(secs)),
        }
        None
    }
}
