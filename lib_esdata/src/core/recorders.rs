//! # Update Recorders
//!
//! One extraction routine per event category. A recorder never touches the
//! shared buffer itself: it stages validated fields in a `FieldBatch`, and the
//! relay merges the whole batch under one short lock. If extraction of one
//! field fails, the field is left out and the others still go through; if a
//! whole category fails, nothing from it reaches the buffer.
//!
//! ## Cross-field rules
//!
//! - A heading and a direct-to are mutually exclusive: assigning one writes the
//!   neutral value of the other (`ahdg = 0`, `direct = ""`).
//! - Temporary altitudes 1 and 2 are the ILS and visual approach clearances;
//!   they additionally write both neutral values.
//! - Scratch pads `LINEUP`, `ONFREQ` and `DE-ICE` are ground states and are
//!   written as `groundstate` rather than `scratch`.
//! - A scratch pad containing `GRP/S/` carries a stand assignment; the text
//!   after the marker is written as `stand`.

use crate::core::field_codec::{self, Field, Raw};
use crate::model::{
    AssignedData, ControllerSnapshot, FieldMap, FieldValue, FlightPlan, RunwayActivity,
};

/// Scratch pad texts that encode a ground state.
pub const GROUND_STATE_SCRATCH: [&str; 3] = ["LINEUP", "ONFREQ", "DE-ICE"];

/// Scratch pad marker preceding a stand assignment.
pub const STAND_MARKER: &str = "GRP/S/";

/// Temporary altitude meaning "cleared ILS approach".
pub const CLEARED_ILS: i64 = 1;
/// Temporary altitude meaning "cleared visual approach".
pub const CLEARED_VISUAL: i64 = 2;

/// # Field Batch
///
/// Fields staged by one recorder call, plus the names of the fields the codec
/// turned down.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldBatch {
    fields: FieldMap,
    rejected: Vec<&'static str>,
}

impl FieldBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `raw` and stages it. Returns whether it was accepted.
    pub fn put<'r>(&mut self, field: Field, raw: impl Into<Raw<'r>>) -> bool {
        match field_codec::validate(field, raw.into()) {
            Some(value) => {
                self.fields.insert(field.name().to_string(), value);
                true
            }
            None => {
                self.rejected.push(field.name());
                false
            }
        }
    }

    /// Stages a neutral value the relay itself decided on.
    fn reset(&mut self, field: Field, value: FieldValue) {
        self.fields.insert(field.name().to_string(), value);
    }

    fn clear_heading(&mut self) {
        self.reset(Field::Heading, FieldValue::Int(0));
    }

    fn clear_direct(&mut self) {
        self.reset(Field::DirectTo, FieldValue::Str(String::new()));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Names of fields whose values were rejected.
    pub fn rejected(&self) -> &[&'static str] {
        &self.rejected
    }

    pub fn into_fields(self) -> FieldMap {
        self.fields
    }
}

/// Route-related fields of a flight plan data update.
pub fn record_flight_plan(fp: &FlightPlan) -> FieldBatch {
    let mut batch = FieldBatch::new();
    batch.put(Field::Origin, &fp.origin);
    batch.put(Field::Destination, &fp.destination);
    batch.put(Field::DepartureRunway, &fp.departure_runway);
    batch.put(Field::Sid, &fp.sid);
    batch.put(Field::ArrivalRunway, &fp.arrival_runway);
    batch.put(Field::Star, &fp.star);
    if fp.final_altitude > 0 {
        batch.put(Field::FinalAltitude, fp.final_altitude);
    }
    batch
}

/// Fields of a controller-assigned data update.
pub fn record_assigned(data: &AssignedData) -> FieldBatch {
    let mut batch = FieldBatch::new();
    match data {
        AssignedData::Squawk(code) => {
            batch.put(Field::Squawk, code);
        }
        AssignedData::FinalAltitude(ft) => {
            batch.put(Field::FinalAltitude, *ft);
        }
        AssignedData::TemporaryAltitude(ft) => {
            let accepted = batch.put(Field::TemporaryAltitude, *ft);
            if accepted && matches!(*ft, CLEARED_ILS | CLEARED_VISUAL) {
                batch.clear_heading();
                batch.clear_direct();
            }
        }
        AssignedData::CommunicationType(kind) => {
            batch.put(Field::CommType, kind);
        }
        AssignedData::ScratchPad(text) => record_scratch_pad(&mut batch, text),
        AssignedData::GroundState(state) => {
            batch.put(Field::GroundState, state);
        }
        AssignedData::ClearanceFlag(cleared) => {
            batch.put(Field::Clearance, *cleared);
        }
        AssignedData::Speed(kt) => {
            batch.put(Field::Speed, *kt);
        }
        AssignedData::Mach(mach) => {
            batch.put(Field::Mach, *mach);
        }
        AssignedData::Rate(fpm) => {
            batch.put(Field::Rate, *fpm);
        }
        AssignedData::Heading(deg) => {
            if batch.put(Field::Heading, *deg) && *deg != 0 {
                batch.clear_direct();
            }
        }
        AssignedData::DirectTo(point) => {
            if batch.put(Field::DirectTo, point) {
                batch.clear_heading();
            }
        }
        AssignedData::DepartureRunway(rwy) => {
            batch.put(Field::DepartureRunway, rwy);
        }
        AssignedData::Sid(sid) => {
            batch.put(Field::Sid, sid);
        }
        AssignedData::ArrivalRunway(rwy) => {
            batch.put(Field::ArrivalRunway, rwy);
        }
        AssignedData::Star(star) => {
            batch.put(Field::Star, star);
        }
        AssignedData::TrackingController(id) => {
            batch.put(Field::Tracking, id);
        }
    }
    batch
}

fn record_scratch_pad(batch: &mut FieldBatch, text: &str) {
    let cleaned = field_codec::sanitize(text);
    if GROUND_STATE_SCRATCH.contains(&cleaned.as_str()) {
        batch.put(Field::GroundState, cleaned.as_str());
    } else if let Some(pos) = cleaned.find(STAND_MARKER) {
        let stand = &cleaned[pos + STAND_MARKER.len()..];
        batch.put(Field::Stand, stand);
    } else {
        batch.put(Field::ScratchPad, cleaned.as_str());
    }
}

/// Marks a flight plan that left the network.
pub fn record_disconnect() -> FieldBatch {
    let mut batch = FieldBatch::new();
    batch.put(Field::Disconnected, true);
    batch
}

/// Runway configuration built from the sector file, nested as
/// airport → runway → {arrival, departure}.
#[derive(Debug, Clone, PartialEq)]
pub struct RunwayConfig {
    pub airports: FieldMap,
    /// The airport bound was exceeded and the map was reset.
    pub reset: bool,
}

/// Builds the nested runway configuration, resetting it wholesale to empty if
/// more than `max_airports` aerodromes show up.
pub fn runway_config(runways: &[RunwayActivity], max_airports: usize) -> RunwayConfig {
    let mut airports = FieldMap::new();
    for activity in runways {
        let (Some(airport), Some(runway)) = (
            field_codec::airport_key(&activity.airport),
            field_codec::runway_key(&activity.runway),
        ) else {
            continue;
        };

        let mut flags = FieldMap::new();
        flags.insert("arrival".to_string(), FieldValue::Bool(activity.arrival));
        flags.insert("departure".to_string(), FieldValue::Bool(activity.departure));

        let entry = airports
            .entry(airport)
            .or_insert_with(|| FieldValue::Map(FieldMap::new()));
        if let FieldValue::Map(rwys) = entry {
            rwys.insert(runway, FieldValue::Map(flags));
        }

        if airports.len() > max_airports {
            return RunwayConfig {
                airports: FieldMap::new(),
                reset: true,
            };
        }
    }
    RunwayConfig {
        airports,
        reset: false,
    }
}

/// The periodic snapshot of the local operator's own position.
pub fn record_self(me: &ControllerSnapshot, rwyconfig: RunwayConfig, version: &str) -> FieldBatch {
    let mut batch = FieldBatch::new();
    batch.put(Field::Name, &me.name);
    batch.put(Field::Frequency, me.frequency);
    batch.put(Field::Controller, me.is_controller);
    batch.put(Field::Version, version);
    batch.put(Field::RunwayConfig, rwyconfig.airports);
    batch
}
