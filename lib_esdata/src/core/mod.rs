//! # Relay Engine
//!
//! The stages an event goes through on its way to the collector.
//!
//! ## Core Components:
//!
//! - **`field_codec`**: bounds and normalizes every raw value before it can
//!   enter the buffer.
//!
//! - **`entity_filter`**: decides whether a flight plan event is relevant at
//!   all (valid, tracked or update-all, Swedish origin or destination).
//!
//! - **`recorders`**: one routine per event category, turning an event into a
//!   batch of validated fields, cross-field rules included.
//!
//! - **`diff_buffer`**: the shared per-entity accumulation of changed fields,
//!   bounded and drained with a single swap.
//!
//! - **`scheduler`**: the enabled/disabled state machine, settle delay, self
//!   snapshot cadence and jittered debounce.
//!
//! - **`poster`**: fire-and-forget, single-flight delivery of a drained
//!   snapshot through a `Transport`.

#![forbid(unsafe_code)]

/// Value bounds and normalization.
pub mod field_codec;
/// Relevance predicate for flight plan events.
pub mod entity_filter;
/// Per-category field extraction.
pub mod recorders;
/// Shared accumulation of changed fields.
pub mod diff_buffer;
/// Tick-driven enable state and dispatch timing.
pub mod scheduler;
/// Single-flight background delivery.
pub mod poster;
