//! Channel service: the cooperative poll loop.
//!
//! [`ChannelService`] owns the module configuration and the three loop-side
//! engines.  The caller supplies a millisecond timestamp on every
//! [`poll`](ChannelService::poll); each engine runs when its cadence is due.
//!
//! ```text
//!                      ┌──────────────────────────────┐
//!   PinPort ─────────▶ │        ChannelService        │ ──▶ EventBus
//!   OutputStore ◀────▶ │  Debounce · Motion · Outputs │
//!   ActionId ────────▶ │                              │ ──▶ PulseScheduler
//!                      └──────────────────────────────┘
//!
//!   every scan_interval_ms   DebounceEngine::scan
//!   every 5 ms               PulseScheduler::advance_block
//!   every 20 ms              MotionEngine::tick, OutputDriver::tick
//! ```

use log::{debug, info};

use crate::action::ActionId;
use crate::channel::ChannelId;
use crate::config::{ChannelConfig, ChannelKind, ModuleConfig};
use crate::dispatch;
use crate::inputs::DebounceEngine;
use crate::motion::MotionEngine;
use crate::outputs::OutputDriver;
use crate::scheduler::{BLOCK_PERIOD_MS, MOTION_PERIOD_MS, PulseScheduler};
use crate::ticks::{Cadence, Millis};

use super::ports::{ConfigError, ConfigPort, EventBus, OutputStore, PinPort, PulseHardware};

// ───────────────────────────────────────────────────────────────
// ChannelService
// ───────────────────────────────────────────────────────────────

pub struct ChannelService {
    config: ModuleConfig,
    debounce: DebounceEngine,
    motion: MotionEngine,
    outputs: OutputDriver,
    scan_cadence: Cadence,
    block_cadence: Cadence,
    motion_cadence: Cadence,
    config_dirty: bool,
}

impl ChannelService {
    /// Construct the service from configuration.
    ///
    /// Nothing is sampled or driven until [`start`](Self::start).
    pub fn new(config: ModuleConfig) -> Self {
        let scan = config.scan_interval_ms;
        Self {
            config,
            debounce: DebounceEngine::new(),
            motion: MotionEngine::new(),
            outputs: OutputDriver::new(),
            scan_cadence: Cadence::new(scan, Millis::ZERO),
            block_cadence: Cadence::new(BLOCK_PERIOD_MS, Millis::ZERO),
            motion_cadence: Cadence::new(MOTION_PERIOD_MS, Millis::ZERO),
            config_dirty: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Seed input state, restore committed outputs and start the cadences.
    pub fn start(&mut self, now: Millis, pins: &mut impl PinPort, store: &impl OutputStore) {
        self.debounce.initialize(pins);
        self.motion.restore(&self.config, store);
        self.outputs.restore(&self.config, store, pins);
        self.scan_cadence = Cadence::new(self.config.scan_interval_ms, now);
        self.block_cadence = Cadence::new(BLOCK_PERIOD_MS, now);
        self.motion_cadence = Cadence::new(MOTION_PERIOD_MS, now);
        info!("ChannelService started ({} ms scan)", self.config.scan_interval_ms);
    }

    // ── Per-poll orchestration ────────────────────────────────

    /// Run whatever is due at `now`.  Never blocks.
    pub fn poll<H: PulseHardware>(
        &mut self,
        now: Millis,
        pins: &mut impl PinPort,
        bus: &mut impl EventBus,
        store: &mut impl OutputStore,
        pulses: &PulseScheduler<H>,
    ) {
        if self.scan_cadence.due(now) {
            self.debounce.scan(&self.config, pins, bus);
        }
        if self.motion_cadence.due(now) {
            self.motion.tick(&self.config, now, bus, store);
            self.outputs.tick(&self.config, pins);
        }
        if self.block_cadence.due(now) {
            pulses.advance_block(&self.config, &self.motion);
        }
    }

    // ── Inbound actions ───────────────────────────────────────

    /// Route an inbound action id.  Unknown ids are dropped.
    pub fn handle_action(&mut self, action: ActionId, pins: &mut impl PinPort, store: &mut impl OutputStore) {
        dispatch::dispatch(
            action,
            &self.config,
            &mut self.motion,
            &mut self.outputs,
            pins,
            store,
        );
    }

    // ── Reconfiguration ───────────────────────────────────────

    /// Change a channel's behavior type.
    ///
    /// The channel gets factory parameters and default bindings for the new
    /// kind, its debounce state is re-sampled and any motion is halted.
    pub fn set_channel_kind(
        &mut self,
        ch: ChannelId,
        kind: ChannelKind,
        pins: &mut impl PinPort,
        bus: &mut impl EventBus,
    ) {
        info!("{ch}: type {:?} -> {kind:?}", self.config.kind(ch));
        self.config.set_channel(ch, ChannelConfig::default_for(kind));
        self.retyped(ch, kind, pins, bus);
        self.config_dirty = true;
    }

    /// Bindings, debounce and motion state for a channel whose kind changed.
    fn retyped(&mut self, ch: ChannelId, kind: ChannelKind, pins: &mut impl PinPort, bus: &mut impl EventBus) {
        dispatch::reset_channel_defaults(ch, kind, bus);
        self.debounce.reseed(ch, pins);
        self.motion.halt(ch);
    }

    /// Replace one channel's parameters without changing bindings.
    ///
    /// The kind must stay the same; type changes go through
    /// [`set_channel_kind`](Self::set_channel_kind).
    pub fn set_channel_config(&mut self, ch: ChannelId, config: ChannelConfig) -> Result<(), ConfigError> {
        if config.kind() != self.config.kind(ch) {
            return Err(ConfigError::ValidationFailed(
                "channel type changes must use set_channel_kind",
            ));
        }
        let mut next = self.config.clone();
        next.set_channel(ch, config);
        next.validate()?;
        debug!("{ch}: parameters updated");
        self.config = next;
        self.config_dirty = true;
        Ok(())
    }

    /// Swap in a whole new configuration.  Rejected unless it validates.
    ///
    /// Every channel whose kind differs from the old configuration is
    /// treated as in [`set_channel_kind`](Self::set_channel_kind), keeping
    /// the new parameters.
    pub fn update_config(
        &mut self,
        config: ModuleConfig,
        pins: &mut impl PinPort,
        bus: &mut impl EventBus,
    ) -> Result<(), ConfigError> {
        config.validate()?;
        let old = core::mem::replace(&mut self.config, config);
        self.scan_cadence.set_period(self.config.scan_interval_ms);
        for ch in ChannelId::all() {
            let kind = self.config.kind(ch);
            if old.kind(ch) != kind {
                info!("{ch}: type {:?} -> {kind:?}", old.kind(ch));
                self.retyped(ch, kind, pins, bus);
            }
        }
        self.config_dirty = true;
        info!("ChannelService: config replaced");
        Ok(())
    }

    /// Default bindings for every channel, by configured kind.
    pub fn reset_all_defaults(&self, bus: &mut impl EventBus) {
        dispatch::reset_all_defaults(&self.config, bus);
        info!("ChannelService: all bindings reset to defaults");
    }

    // ── Persistence ───────────────────────────────────────────

    /// Persist the config if it changed.  Returns whether it was written.
    pub fn save_config_if_dirty(&mut self, port: &impl ConfigPort) -> Result<bool, ConfigError> {
        if !self.config_dirty {
            return Ok(false);
        }
        port.save(&self.config)?;
        self.config_dirty = false;
        Ok(true)
    }

    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn motion(&self) -> &MotionEngine {
        &self.motion
    }

    pub fn outputs(&self) -> &OutputDriver {
        &self.outputs
    }

    pub fn debounce(&self) -> &DebounceEngine {
        &self.debounce
    }
}
