//! # Host Event Surface
//!
//! What the relay consumes from the radar client it is embedded in. These are
//! plain snapshots: the relay never calls back into the host except through the
//! read-only `HostSession` trait during timer ticks.
//!
//! All types deserialize from JSON so that a host feed (see `server_esdata`)
//! can replay them from newline-delimited event logs.

use serde::{Deserialize, Serialize};

/// # Flight Plan Snapshot
///
/// The fields of a flight plan the relay reads. The host reports unset text
/// fields as empty strings and unset numbers as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlightPlan {
    /// Aircraft callsign.
    pub callsign: String,
    /// The host has received and fully populated this flight plan.
    pub valid: bool,
    /// The local operator currently tracks this flight plan.
    pub tracked_by_me: bool,
    /// Departure aerodrome (ICAO).
    pub origin: String,
    /// Destination aerodrome (ICAO).
    pub destination: String,
    /// Departure runway as filed/assigned in the route.
    pub departure_runway: String,
    /// Standard instrument departure.
    pub sid: String,
    /// Arrival runway.
    pub arrival_runway: String,
    /// Standard terminal arrival route.
    pub star: String,
    /// Requested final altitude in feet.
    pub final_altitude: i64,
}

/// # Controller-Assigned Data
///
/// One variant per data type the host signals in its
/// "controller assigned data changed" callback, each carrying the new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AssignedData {
    /// Transponder code.
    Squawk(String),
    /// Cleared final altitude in feet.
    FinalAltitude(i64),
    /// Cleared temporary altitude in feet. 1 and 2 are approach clearances.
    TemporaryAltitude(i64),
    /// Voice / receive-only / text.
    CommunicationType(String),
    /// Free-text scratch pad.
    ScratchPad(String),
    /// Ground state (STUP, PUSH, TAXI, DEPA, ...).
    GroundState(String),
    /// Clearance delivered.
    ClearanceFlag(bool),
    /// Assigned speed in knots.
    Speed(i64),
    /// Assigned Mach number.
    Mach(f64),
    /// Assigned climb/descent rate in feet per minute.
    Rate(i64),
    /// Assigned heading in degrees, 0 meaning none.
    Heading(i64),
    /// Direct-to waypoint name.
    DirectTo(String),
    /// Assigned departure runway.
    DepartureRunway(String),
    /// Assigned SID.
    Sid(String),
    /// Assigned arrival runway.
    ArrivalRunway(String),
    /// Assigned STAR.
    Star(String),
    /// Callsign of the controller tracking the flight.
    TrackingController(String),
}

/// # Connection Type
///
/// How the host is connected. Only a direct network connection is "live".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    /// Offline.
    #[default]
    NoConnection,
    /// Direct connection to the network.
    Direct,
    /// Connected through another client acting as proxy.
    ViaProxy,
    /// Running a simulator session as server.
    SimulatorServer,
    /// Replaying a recorded session.
    Playback,
    /// Connected to a simulator session.
    SimulatorClient,
    /// Connected to the training network.
    Sweatbox,
}

impl ConnectionType {
    /// Whether this connection should enable recording and dispatch.
    pub fn is_live(self) -> bool {
        self == ConnectionType::Direct
    }
}

/// # Own Controller Snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerSnapshot {
    /// Logged-in callsign, e.g. `ESSA_TWR`.
    pub callsign: String,
    /// Display name of the operator.
    pub name: String,
    /// Primary frequency in MHz.
    pub frequency: f64,
    /// Logged in as a controller rather than an observer.
    pub is_controller: bool,
}

/// # Runway Activity
///
/// One runway of one aerodrome from the sector file, with its active flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunwayActivity {
    /// Aerodrome identifier; may carry padding whitespace from the sector file.
    pub airport: String,
    /// Runway designator.
    pub runway: String,
    /// Active for arrivals.
    pub arrival: bool,
    /// Active for departures.
    pub departure: bool,
}

/// # Host Session
///
/// Read-only queries the relay makes on each timer tick.
pub trait HostSession {
    /// Current network connection.
    fn connection_type(&self) -> ConnectionType;
    /// The local operator's own position, if logged in.
    fn controller_myself(&self) -> Option<ControllerSnapshot>;
    /// Every known aerodrome runway and whether it is active.
    fn runway_activity(&self) -> Vec<RunwayActivity>;
}
