//! Plain digital outputs: on, off and flash.
//!
//! The logical level is stored; the pin level is the logical level XOR the
//! channel's `inverted` flag.  Flashing toggles the logical level every
//! `flash_ticks` motion ticks (20 ms each).

use log::debug;

use crate::action::OutputCommand;
use crate::app::ports::{OutputStore, PinPort};
use crate::channel::{ChannelId, NUM_CHANNELS};
use crate::config::{ChannelConfig, ModuleConfig, OutputParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct OutputChannel {
    /// Logical level currently driven.
    on: bool,
    flashing: bool,
    /// Motion ticks since the last flash toggle.
    elapsed: u8,
}

pub struct OutputDriver {
    channels: [OutputChannel; NUM_CHANNELS],
}

impl OutputDriver {
    pub fn new() -> Self {
        Self {
            channels: [OutputChannel::default(); NUM_CHANNELS],
        }
    }

    /// Start-up: drive every Output channel to its last committed level.
    pub fn restore(&mut self, config: &ModuleConfig, store: &impl OutputStore, pins: &mut impl PinPort) {
        for ch in ChannelId::all() {
            let ChannelConfig::Output(params) = config.channel(ch) else {
                continue;
            };
            let on = store.load(ch).is_some_and(|v| v != 0);
            self.channels[ch.index()] = OutputChannel { on, ..OutputChannel::default() };
            drive(pins, ch, params, on);
        }
    }

    pub fn apply(
        &mut self,
        ch: ChannelId,
        command: OutputCommand,
        params: &OutputParams,
        pins: &mut impl PinPort,
        store: &mut impl OutputStore,
    ) {
        let c = &mut self.channels[ch.index()];
        match command {
            OutputCommand::On | OutputCommand::Off => {
                let on = command == OutputCommand::On;
                *c = OutputChannel { on, ..OutputChannel::default() };
                store.commit(ch, u8::from(on));
            }
            OutputCommand::Flash => {
                *c = OutputChannel { on: true, flashing: true, elapsed: 0 };
            }
        }
        debug!("{ch}: output {command:?}");
        drive(pins, ch, params, c.on);
    }

    /// Motion-tick housekeeping for flashing outputs.
    pub fn tick(&mut self, config: &ModuleConfig, pins: &mut impl PinPort) {
        for ch in ChannelId::all() {
            let c = &mut self.channels[ch.index()];
            let ChannelConfig::Output(params) = config.channel(ch) else {
                *c = OutputChannel::default();
                continue;
            };
            if !c.flashing {
                continue;
            }
            c.elapsed = c.elapsed.saturating_add(1);
            if c.elapsed >= params.flash_ticks {
                c.elapsed = 0;
                c.on = !c.on;
                drive(pins, ch, params, c.on);
            }
        }
    }

    /// Logical level of `ch`.
    pub fn is_on(&self, ch: ChannelId) -> bool {
        self.channels[ch.index()].on
    }

    pub fn is_flashing(&self, ch: ChannelId) -> bool {
        self.channels[ch.index()].flashing
    }
}

impl Default for OutputDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn drive(pins: &mut impl PinPort, ch: ChannelId, params: &OutputParams, on: bool) {
    pins.write_level(ch, on != params.inverted);
}
