//! # Field Codec
//!
//! Gatekeeper between raw host values and the diff buffer. Every value a
//! recorder wants to write passes through `validate`, which either returns the
//! normalized `FieldValue` or `None`. A rejection is never an error: the field
//! is simply not written.
//!
//! Text is sanitized before its bounds are checked (surrounding whitespace
//! trimmed, control characters removed). Airport identifiers additionally lose
//! all inner whitespace since they become map keys.
//!
//! Squawk is stricter than a length check: exactly four characters, all octal
//! digits, so a value like `7080` is dropped.

use crate::model::{FieldMap, FieldValue, MAX_ENTITY_ID_LEN};

pub const MAX_ALTITUDE: i64 = 100_000;
pub const MAX_RATE: i64 = 50_000;
pub const MAX_HEADING: i64 = 360;
pub const MAX_SPEED: i64 = 1_500;
pub const MAX_MACH: f64 = 10.0;
pub const MIN_FREQUENCY: f64 = 100.0;
pub const MAX_FREQUENCY: f64 = 200.0;

pub const MAX_SCRATCH_PAD_LEN: usize = 50;
pub const MAX_WAYPOINT_LEN: usize = 50;
pub const MAX_PROCEDURE_LEN: usize = 10;
pub const MAX_RUNWAY_LEN: usize = 5;
pub const MAX_AIRPORT_LEN: usize = 10;
pub const MAX_STAND_LEN: usize = 10;
pub const MAX_GROUND_STATE_LEN: usize = 10;
pub const MAX_NAME_LEN: usize = 50;
pub const MAX_VERSION_LEN: usize = 20;

/// # Field
///
/// Every field name the relay ever writes, with its wire name and its
/// validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Squawk,
    FinalAltitude,
    TemporaryAltitude,
    CommType,
    ScratchPad,
    GroundState,
    Stand,
    Clearance,
    Speed,
    Mach,
    Rate,
    Heading,
    DirectTo,
    DepartureRunway,
    Sid,
    ArrivalRunway,
    Star,
    Origin,
    Destination,
    Tracking,
    Disconnected,
    Name,
    Frequency,
    Controller,
    Version,
    RunwayConfig,
}

impl Field {
    /// Key used in the outbound JSON document.
    pub fn name(self) -> &'static str {
        match self {
            Field::Squawk => "squawk",
            Field::FinalAltitude => "rfl",
            Field::TemporaryAltitude => "cfl",
            Field::CommType => "comm",
            Field::ScratchPad => "scratch",
            Field::GroundState => "groundstate",
            Field::Stand => "stand",
            Field::Clearance => "clearance",
            Field::Speed => "aspd",
            Field::Mach => "amach",
            Field::Rate => "arate",
            Field::Heading => "ahdg",
            Field::DirectTo => "direct",
            Field::DepartureRunway => "deprwy",
            Field::Sid => "sid",
            Field::ArrivalRunway => "arrrwy",
            Field::Star => "star",
            Field::Origin => "adep",
            Field::Destination => "ades",
            Field::Tracking => "tracking",
            Field::Disconnected => "disconnected",
            Field::Name => "name",
            Field::Frequency => "freq",
            Field::Controller => "controller",
            Field::Version => "version",
            Field::RunwayConfig => "rwyconfig",
        }
    }
}

/// A value as the host delivered it, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Raw<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'a str),
    Map(FieldMap),
}

impl From<bool> for Raw<'_> {
    fn from(v: bool) -> Self {
        Raw::Bool(v)
    }
}

impl From<i64> for Raw<'_> {
    fn from(v: i64) -> Self {
        Raw::Int(v)
    }
}

impl From<f64> for Raw<'_> {
    fn from(v: f64) -> Self {
        Raw::Float(v)
    }
}

impl<'a> From<&'a str> for Raw<'a> {
    fn from(v: &'a str) -> Self {
        Raw::Text(v)
    }
}

impl<'a> From<&'a String> for Raw<'a> {
    fn from(v: &'a String) -> Self {
        Raw::Text(v.as_str())
    }
}

impl From<FieldMap> for Raw<'_> {
    fn from(v: FieldMap) -> Self {
        Raw::Map(v)
    }
}

/// Validates and normalizes one value for `field`.
///
/// Returns `None` when the value is out of bounds, of the wrong kind, or empty
/// where emptiness is not allowed.
pub fn validate(field: Field, raw: Raw<'_>) -> Option<FieldValue> {
    match field {
        Field::Squawk => squawk(raw),
        Field::FinalAltitude | Field::TemporaryAltitude => int_in(raw, 0, MAX_ALTITUDE),
        Field::Rate => int_in(raw, -MAX_RATE, MAX_RATE),
        Field::Heading => int_in(raw, 0, MAX_HEADING),
        Field::Speed => int_in(raw, 0, MAX_SPEED),
        Field::Mach => float_in(raw, 0.0, MAX_MACH),
        Field::Frequency => float_in(raw, MIN_FREQUENCY, MAX_FREQUENCY),
        Field::ScratchPad => text(raw, MAX_SCRATCH_PAD_LEN, false),
        Field::DirectTo => text(raw, MAX_WAYPOINT_LEN, false),
        Field::Sid | Field::Star => text(raw, MAX_PROCEDURE_LEN, false),
        Field::DepartureRunway | Field::ArrivalRunway => text(raw, MAX_RUNWAY_LEN, false),
        Field::Origin | Field::Destination => airport(raw),
        Field::Tracking => text(raw, MAX_ENTITY_ID_LEN, false),
        Field::Stand => text(raw, MAX_STAND_LEN, false),
        Field::GroundState => text(raw, MAX_GROUND_STATE_LEN, true),
        Field::CommType => text(raw, 1, false),
        Field::Name => text(raw, MAX_NAME_LEN, false),
        Field::Version => text(raw, MAX_VERSION_LEN, false),
        Field::Clearance | Field::Disconnected | Field::Controller => match raw {
            Raw::Bool(b) => Some(FieldValue::Bool(b)),
            _ => None,
        },
        Field::RunwayConfig => match raw {
            Raw::Map(m) => Some(FieldValue::Map(m)),
            _ => None,
        },
    }
}

/// Normalizes an airport identifier for use as a map key.
pub fn airport_key(raw: &str) -> Option<String> {
    let key: String = raw.chars().filter(|c| !c.is_whitespace() && !c.is_control()).collect();
    bounded(key, MAX_AIRPORT_LEN, false)
}

/// Normalizes a runway designator for use as a map key.
pub fn runway_key(raw: &str) -> Option<String> {
    bounded(sanitize(raw), MAX_RUNWAY_LEN, false)
}

/// Trims and drops control characters.
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    cleaned.trim().to_string()
}

fn bounded(s: String, max_len: usize, allow_empty: bool) -> Option<String> {
    let len = s.chars().count();
    if (len == 0 && !allow_empty) || len > max_len {
        return None;
    }
    Some(s)
}

fn text(raw: Raw<'_>, max_len: usize, allow_empty: bool) -> Option<FieldValue> {
    match raw {
        Raw::Text(s) => bounded(sanitize(s), max_len, allow_empty).map(FieldValue::Str),
        _ => None,
    }
}

fn airport(raw: Raw<'_>) -> Option<FieldValue> {
    match raw {
        Raw::Text(s) => airport_key(s).map(FieldValue::Str),
        _ => None,
    }
}

fn squawk(raw: Raw<'_>) -> Option<FieldValue> {
    let Raw::Text(s) = raw else {
        return None;
    };
    let code = sanitize(s);
    if code.chars().count() == 4 && code.chars().all(|c| ('0'..='7').contains(&c)) {
        Some(FieldValue::Str(code))
    } else {
        None
    }
}

fn int_in(raw: Raw<'_>, min: i64, max: i64) -> Option<FieldValue> {
    match raw {
        Raw::Int(v) if (min..=max).contains(&v) => Some(FieldValue::Int(v)),
        _ => None,
    }
}

fn float_in(raw: Raw<'_>, min: f64, max: f64) -> Option<FieldValue> {
    let v = match raw {
        Raw::Float(v) => v,
        Raw::Int(v) => v as f64,
        _ => return None,
    };
    if v.is_finite() && (min..=max).contains(&v) {
        Some(FieldValue::Float(v))
    } else {
        None
    }
}
