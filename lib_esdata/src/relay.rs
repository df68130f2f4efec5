//! # Relay
//!
//! The entry point the host talks to. Each host callback maps to one method;
//! all of them run on the host's thread and return quickly. Recording touches
//! the shared buffer for one merge, and sending happens on the runtime.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::configs::RelayConfig;
use crate::core::diff_buffer::{self, DiffBuffer, MergeOutcome, SharedDiffBuffer};
use crate::core::entity_filter;
use crate::core::poster::{DispatchOutcome, Poster};
use crate::core::recorders::{self, FieldBatch};
use crate::core::scheduler::{DispatchScheduler, DispatchState, ModeChange, TickAction};
use crate::error::RelayError;
use crate::model::{AssignedData, EntityId, FlightPlan, HostSession};
use crate::retrieve::Transport;

/// Handle to a dispatch started by a tick.
pub type DispatchHandle = JoinHandle<Result<DispatchOutcome, RelayError>>;

/// # Relay
pub struct Relay {
    config: RelayConfig,
    buffer: SharedDiffBuffer,
    scheduler: DispatchScheduler,
    poster: Poster,
}

impl Relay {
    /// Creates a relay that sends through `transport`, spawning sends on
    /// `runtime`.
    pub fn new(config: RelayConfig, transport: Arc<dyn Transport>, runtime: Handle) -> Self {
        let buffer = DiffBuffer::shared(config.max_entities);
        let poster = Poster::new(transport, Arc::clone(&buffer), config.lock_timeout(), runtime);
        let scheduler = DispatchScheduler::new(&config);
        log::info!("{}", config);
        Self {
            config,
            buffer,
            scheduler,
            poster,
        }
    }

    /// Creates a relay posting over HTTP to the configured collector.
    #[cfg(feature = "retrieve")]
    pub fn with_http(config: RelayConfig, runtime: Handle) -> Result<Self, RelayError> {
        let transport = crate::retrieve::HttpTransport::from_config(&config)?;
        Ok(Self::new(config, Arc::new(transport), runtime))
    }

    /// Flight plan data (route) changed.
    pub fn on_flight_plan_data_update(&mut self, fp: &FlightPlan) {
        if let Some(id) = self.admit(fp) {
            self.commit(id, recorders::record_flight_plan(fp), "flight plan");
        }
    }

    /// A controller changed one assigned-data item of a flight plan.
    pub fn on_controller_assigned_data_update(&mut self, fp: &FlightPlan, data: &AssignedData) {
        if let Some(id) = self.admit(fp) {
            self.commit(id, recorders::record_assigned(data), "assigned data");
        }
    }

    /// A flight plan left the network.
    pub fn on_flight_plan_disconnect(&mut self, fp: &FlightPlan) {
        if let Some(id) = self.admit(fp) {
            self.commit(id, recorders::record_disconnect(), "disconnect");
        }
    }

    /// Host timer callback, roughly once a second.
    pub fn on_timer(&mut self, counter: u64, host: &dyn HostSession) -> Option<DispatchHandle> {
        self.on_timer_at(counter, host, Instant::now())
    }

    /// `on_timer` with an explicit clock.
    pub fn on_timer_at(
        &mut self,
        counter: u64,
        host: &dyn HostSession,
        now: Instant,
    ) -> Option<DispatchHandle> {
        match self.scheduler.observe_connection(host.connection_type(), now) {
            ModeChange::WentLive => {
                log::info!(
                    "Connected live, recording starts in {}s",
                    self.config.settle_delay_secs
                );
            }
            ModeChange::WentOffline => {
                let pending = self.pending_entities();
                log::info!("Connection no longer live, {} entities pending", pending);
                if self.scheduler.flush_on_disconnect() && pending > 0 {
                    return Some(self.poster.dispatch());
                }
                return None;
            }
            ModeChange::Unchanged => {}
        }

        let TickAction::Run { self_snapshot } = self.scheduler.plan_tick(counter, now) else {
            return None;
        };
        if self_snapshot {
            self.update_myself(host);
        }

        let empty = diff_buffer::lock(&self.buffer).is_empty();
        if !self.scheduler.try_begin_dispatch(empty, now) {
            return None;
        }
        self.note(format_args!("Dispatching {} entities", self.pending_entities()));
        Some(self.poster.dispatch())
    }

    /// Records the self snapshot right away.
    pub fn update_myself(&mut self, host: &dyn HostSession) {
        let Some(me) = host.controller_myself() else {
            self.note(format_args!("Self snapshot skipped: no own controller"));
            return;
        };
        let Some(id) = EntityId::parse(&me.callsign) else {
            let err = RelayError::InvalidEntity(me.callsign);
            self.note(format_args!("Self snapshot skipped: {}", err));
            return;
        };

        let rwyconfig = recorders::runway_config(&host.runway_activity(), self.config.max_airports);
        if rwyconfig.reset {
            log::warn!(
                "Runway configuration exceeded {} airports and was reset",
                self.config.max_airports
            );
        }
        let batch = recorders::record_self(&me, rwyconfig, &self.config.plugin_version);
        self.commit(id, batch, "self snapshot");
    }

    /// Sends whatever is pending and waits for the result.
    pub async fn flush(&self) -> Result<DispatchOutcome, RelayError> {
        self.poster.flush().await
    }

    pub fn state(&self) -> &DispatchState {
        self.scheduler.state()
    }

    pub fn state_mut(&mut self) -> &mut DispatchState {
        self.scheduler.state_mut()
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.scheduler.state().is_enabled()
    }

    pub fn pending_entities(&self) -> usize {
        diff_buffer::lock(&self.buffer).len()
    }

    /// The pending fields for `id`, as JSON. Mostly for diagnostics.
    pub fn pending_for(&self, id: &EntityId) -> Option<serde_json::Value> {
        let guard = diff_buffer::lock(&self.buffer);
        guard.get(id).and_then(|fields| serde_json::to_value(fields).ok())
    }

    pub fn last_error(&self) -> Option<String> {
        self.poster.last_error()
    }

    /// Filter plus enable check for event-driven recorders.
    fn admit(&self, fp: &FlightPlan) -> Option<EntityId> {
        if !self.scheduler.is_recording(Instant::now()) {
            return None;
        }
        if !entity_filter::is_in_scope(fp, self.state().update_all) {
            return None;
        }
        EntityId::parse(&fp.callsign)
    }

    fn commit(&self, id: EntityId, batch: FieldBatch, category: &str) {
        if !batch.rejected().is_empty() {
            self.note(format_args!("{} for {}: rejected {:?}", category, id, batch.rejected()));
        }
        let outcome = diff_buffer::lock(&self.buffer).merge(id, batch.into_fields());
        if let MergeOutcome::Discarded(dropped) = outcome {
            log::warn!(
                "Diff buffer exceeded {} entities, discarded {} pending entries",
                self.config.max_entities,
                dropped
            );
        }
    }

    /// Diagnostic line, promoted to `info` in debug mode.
    fn note(&self, args: fmt::Arguments<'_>) {
        if self.state().debug {
            log::info!("{}", args);
        } else {
            log::debug!("{}", args);
        }
    }
}
