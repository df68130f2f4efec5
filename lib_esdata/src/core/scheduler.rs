//! # Dispatch Scheduler
//!
//! Decides, once per host tick, whether the relay records, takes the self
//! snapshot, or hands the buffer to the poster.
//!
//! ## Core Functionality:
//!
//! - **Mode tracking**: `Disabled` until the host reports a direct network
//!   connection, back to `Disabled` as soon as it reports anything else. The
//!   buffer is not touched by either transition.
//!
//! - **Settle delay**: after going live nothing is recorded or sent until the
//!   delay has passed, so stale state from before a reconnect is not posted.
//!
//! - **Debounce with jitter**: dispatches are at least `base + jitter` seconds
//!   apart, the jitter re-rolled after every attempt so many relays do not hit
//!   the collector in lock-step.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::configs::RelayConfig;
use crate::model::ConnectionType;

/// Operational states of the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayMode {
    /// Not connected live; nothing is recorded or sent.
    #[default]
    Disabled,
    /// Connected live.
    Enabled,
}

/// What a connection report changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    Unchanged,
    WentLive,
    WentOffline,
}

/// What the relay should do on this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Disabled, or still inside the settle delay.
    Idle,
    /// Enabled and settled. `self_snapshot` is set on refresh ticks.
    Run { self_snapshot: bool },
}

/// Runtime state the scheduler and recorders share. The two toggles are
/// changed by operator commands.
#[derive(Debug, Clone, Default)]
pub struct DispatchState {
    pub mode: RelayMode,
    pub enabled_at: Option<Instant>,
    pub last_post: Option<Instant>,
    pub debounce_window: Duration,
    pub update_all: bool,
    pub debug: bool,
}

impl DispatchState {
    pub fn is_enabled(&self) -> bool {
        self.mode == RelayMode::Enabled
    }
}

/// # Dispatch Scheduler
#[derive(Debug, Clone)]
pub struct DispatchScheduler {
    settle_delay: Duration,
    self_refresh_ticks: u64,
    debounce_base: Duration,
    debounce_jitter_secs: u64,
    flush_on_disconnect: bool,
    state: DispatchState,
}

impl DispatchScheduler {
    pub fn new(config: &RelayConfig) -> Self {
        let mut scheduler = Self {
            settle_delay: config.settle_delay(),
            self_refresh_ticks: config.self_refresh_ticks,
            debounce_base: Duration::from_secs(config.debounce_base_secs),
            debounce_jitter_secs: config.debounce_jitter_secs,
            flush_on_disconnect: config.flush_on_disconnect,
            state: DispatchState {
                update_all: config.update_all,
                debug: config.debug,
                ..Default::default()
            },
        };
        scheduler.state.debounce_window = scheduler.roll_window();
        scheduler
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut DispatchState {
        &mut self.state
    }

    pub fn flush_on_disconnect(&self) -> bool {
        self.flush_on_disconnect
    }

    /// Applies the host's current connection type.
    pub fn observe_connection(&mut self, connection: ConnectionType, now: Instant) -> ModeChange {
        match (self.state.mode, connection.is_live()) {
            (RelayMode::Disabled, true) => {
                self.state.mode = RelayMode::Enabled;
                self.state.enabled_at = Some(now);
                ModeChange::WentLive
            }
            (RelayMode::Enabled, false) => {
                self.state.mode = RelayMode::Disabled;
                self.state.enabled_at = None;
                ModeChange::WentOffline
            }
            _ => ModeChange::Unchanged,
        }
    }

    /// Whether events arriving at `now` should be recorded.
    pub fn is_recording(&self, now: Instant) -> bool {
        match (self.state.mode, self.state.enabled_at) {
            (RelayMode::Enabled, Some(since)) => {
                now.saturating_duration_since(since) >= self.settle_delay
            }
            _ => false,
        }
    }

    /// Plans tick number `counter`.
    pub fn plan_tick(&self, counter: u64, now: Instant) -> TickAction {
        if !self.is_recording(now) {
            return TickAction::Idle;
        }
        let self_snapshot = self.self_refresh_ticks > 0 && counter % self.self_refresh_ticks == 0;
        TickAction::Run { self_snapshot }
    }

    /// Returns `true` and stamps `now` as the last attempt if a dispatch is
    /// due. Never due for an empty buffer.
    pub fn try_begin_dispatch(&mut self, buffer_empty: bool, now: Instant) -> bool {
        if buffer_empty {
            return false;
        }
        if let Some(last) = self.state.last_post {
            if now.saturating_duration_since(last) < self.state.debounce_window {
                return false;
            }
        }
        self.state.last_post = Some(now);
        self.state.debounce_window = self.roll_window();
        true
    }

    fn roll_window(&self) -> Duration {
        let jitter = if self.debounce_jitter_secs == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.debounce_jitter_secs)
        };
        self.debounce_base + Duration::from_secs(jitter)
    }
}
