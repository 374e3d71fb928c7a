//! GPIO adapter: implements [`PinPort`] over `embedded-hal` pins.
//!
//! Each of the 16 channels owns one bidirectional pin.  A pin error never
//! reaches the engines: reads fall back to low and failed writes are
//! logged and skipped.

use embedded_hal::digital::{Error as _, InputPin, OutputPin};
use log::warn;

use crate::app::ports::PinPort;
use crate::channel::{ChannelId, NUM_CHANNELS};

pub struct GpioBank<P> {
    pins: [P; NUM_CHANNELS],
}

impl<P: InputPin + OutputPin> GpioBank<P> {
    pub fn new(pins: [P; NUM_CHANNELS]) -> Self {
        Self { pins }
    }

    pub fn into_inner(self) -> [P; NUM_CHANNELS] {
        self.pins
    }
}

impl<P: InputPin + OutputPin> PinPort for GpioBank<P> {
    fn read_level(&mut self, ch: ChannelId) -> bool {
        match self.pins[ch.index()].is_high() {
            Ok(level) => level,
            Err(e) => {
                warn!("GpioBank: {ch} read failed ({:?})", e.kind());
                false
            }
        }
    }

    fn write_level(&mut self, ch: ChannelId, high: bool) {
        let pin = &mut self.pins[ch.index()];
        let result = if high { pin.set_high() } else { pin.set_low() };
        if let Err(e) = result {
            warn!("GpioBank: {ch} write failed ({:?})", e.kind());
        }
    }
}
