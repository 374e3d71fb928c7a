//! Polled debounce and edge detection for digital inputs.
//!
//! Every scan samples each Input channel once.  A raw level that disagrees
//! with the reported level bumps a per-channel counter; a level that agrees
//! resets it.  The change is confirmed only after `on_delay` (rising) or
//! `off_delay` (falling) consecutive disagreeing scans:
//!
//! ```text
//!   raw      0 1 1 0 1 1 1
//!   count    0 1 2 0 1 2 3 ──▶ on_delay = 3 reached, OffToOn emitted
//! ```
//!
//! The counter measures scans, not elapsed time.

use log::debug;

use crate::action::{InputEdge, Produced};
use crate::app::ports::{EventBus, PinPort};
use crate::channel::{ChannelId, NUM_CHANNELS};
use crate::config::{ChannelConfig, InputParams, ModuleConfig};

/// Debounce state of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputChannelState {
    /// Last confirmed raw level.
    pub reported_level: bool,
    /// Consecutive scans the raw level has disagreed with `reported_level`.
    pub debounce_count: u8,
}

pub struct DebounceEngine {
    channels: [InputChannelState; NUM_CHANNELS],
}

impl DebounceEngine {
    pub fn new() -> Self {
        Self {
            channels: [InputChannelState::default(); NUM_CHANNELS],
        }
    }

    /// Seed every channel from one raw sample.  Emits nothing.
    pub fn initialize(&mut self, pins: &mut impl PinPort) {
        for ch in ChannelId::all() {
            self.reseed(ch, pins);
        }
    }

    /// Re-sample one channel and clear its counter.
    pub fn reseed(&mut self, ch: ChannelId, pins: &mut impl PinPort) {
        self.channels[ch.index()] = InputChannelState {
            reported_level: pins.read_level(ch),
            debounce_count: 0,
        };
    }

    /// One scan of every Input channel.
    pub fn scan(&mut self, config: &ModuleConfig, pins: &mut impl PinPort, bus: &mut impl EventBus) {
        for ch in ChannelId::all() {
            let ChannelConfig::Input(params) = config.channel(ch) else {
                continue;
            };
            let raw = pins.read_level(ch);
            if let Some(edge) = self.sample(ch, raw, params) {
                if edge == InputEdge::OnToOff && !params.off_events {
                    continue;
                }
                let produced = Produced::Input(edge);
                debug!("{ch}: debounced {edge:?}");
                bus.emit_producer_action(produced.action(ch), produced.asserted());
            }
        }
    }

    /// Feed one raw sample; returns the confirmed edge, if any.
    fn sample(&mut self, ch: ChannelId, raw: bool, params: &InputParams) -> Option<InputEdge> {
        let state = &mut self.channels[ch.index()];
        if raw == state.reported_level {
            state.debounce_count = 0;
            return None;
        }

        state.debounce_count = state.debounce_count.saturating_add(1);
        let delay = if raw { params.on_delay } else { params.off_delay };
        if state.debounce_count < delay {
            return None;
        }

        state.reported_level = raw;
        state.debounce_count = 0;
        if raw != params.inverted {
            Some(InputEdge::OffToOn)
        } else {
            Some(InputEdge::OnToOff)
        }
    }

    pub fn state(&self, ch: ChannelId) -> InputChannelState {
        self.channels[ch.index()]
    }
}

impl Default for DebounceEngine {
    fn default() -> Self {
        Self::new()
    }
}
