//! # Data Model
//!
//! Value types shared by every stage of the relay:
//!
//! - **`field_value`**: `EntityId`, the `FieldValue` union and `FieldMap`, i.e.
//!   what a diff entry is made of and how it serializes onto the wire.
//! - **`host_events`**: the inbound surface of the host (flight-plan snapshots,
//!   controller-assigned data, own-controller snapshot, runway configuration,
//!   connection state) and the `HostSession` trait the timer queries.

/// Diff entry building blocks.
pub mod field_value;
/// Inbound host event types.
pub mod host_events;

pub use field_value::{EntityId, FieldMap, FieldValue, MAX_ENTITY_ID_LEN};
pub use host_events::{
    AssignedData, ConnectionType, ControllerSnapshot, FlightPlan, HostSession, RunwayActivity,
};
