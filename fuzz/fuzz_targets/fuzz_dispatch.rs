//! Fuzz target: inbound actions, retyping and pin noise against the poll loop
//!
//! Interprets the input as a script of two-byte operations and verifies:
//! - No panics for any action id, channel or kind
//! - No pulse pin is left high once every armed timer has expired
//! - Only motion channels are ever left powered
//!
//! cargo fuzz run fuzz_dispatch

#![no_main]

use iochan::action::ActionId;
use iochan::app::ports::{BindingKind, EventBus, OutputStore, PinPort, PulseHardware};
use iochan::app::service::ChannelService;
use iochan::channel::{ChannelId, NUM_CHANNELS, TimerId};
use iochan::config::{ChannelKind, ModuleConfig};
use iochan::motion::MotionState;
use iochan::scheduler::PulseScheduler;
use iochan::ticks::Millis;
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct Pins([bool; NUM_CHANNELS]);

impl PinPort for Pins {
    fn read_level(&mut self, ch: ChannelId) -> bool {
        self.0[ch.index()]
    }
    fn write_level(&mut self, ch: ChannelId, high: bool) {
        self.0[ch.index()] = high;
    }
}

#[derive(Default)]
struct Store([Option<u8>; NUM_CHANNELS]);

impl OutputStore for Store {
    fn load(&self, ch: ChannelId) -> Option<u8> {
        self.0[ch.index()]
    }
    fn commit(&mut self, ch: ChannelId, value: u8) {
        self.0[ch.index()] = Some(value);
    }
}

struct NullBus;

impl EventBus for NullBus {
    fn emit_producer_action(&mut self, _: ActionId, _: bool) {}
    fn register_binding(&mut self, _: ChannelId, _: BindingKind, _: ActionId) {}
    fn clear_bindings(&mut self, _: ChannelId) {}
}

#[derive(Default)]
struct PinWatch([bool; NUM_CHANNELS]);

impl PulseHardware for PinWatch {
    fn start_timer(&mut self, _: TimerId, _: u16) {}
    fn reload_timer(&mut self, _: TimerId, _: u16) {}
    fn stop_timer(&mut self, _: TimerId) {}
    fn set_pulse_pin(&mut self, ch: ChannelId, high: bool) {
        self.0[ch.index()] = high;
    }
}

const KINDS: [ChannelKind; 5] = [
    ChannelKind::Input,
    ChannelKind::Output,
    ChannelKind::Servo,
    ChannelKind::Bounce,
    ChannelKind::Multi,
];

fuzz_target!(|data: &[u8]| {
    let mut svc = ChannelService::new(ModuleConfig::default());
    let (mut pins, mut store, mut bus) = (Pins::default(), Store::default(), NullBus);
    let pulses = PulseScheduler::new(PinWatch::default());
    let mut now = Millis::ZERO;
    svc.start(now, &mut pins, &store);

    for op in data.chunks(2) {
        let (a, b) = (op[0], op.get(1).copied().unwrap_or(0));
        match a % 4 {
            0 => svc.handle_action(ActionId(b), &mut pins, &mut store),
            1 => {
                if let Some(ch) = ChannelId::new(b % 16) {
                    let kind = KINDS[(b as usize >> 4) % KINDS.len()];
                    svc.set_channel_kind(ch, kind, &mut pins, &mut bus);
                }
            }
            2 => pins.0[(b % 16) as usize] ^= true,
            _ => {
                for _ in 0..=(b % 64) {
                    now = now.after(1);
                    svc.poll(now, &mut pins, &mut bus, &mut store, &pulses);
                }
            }
        }

        for t in TimerId::all() {
            while pulses.armed(t).is_some() {
                pulses.on_timer_expired(t);
            }
        }
        pulses.with_hardware(|hw| assert!(hw.0.iter().all(|high| !high), "pulse pin left high"));

        for ch in ChannelId::all() {
            let s = svc.motion().channel(ch);
            if s.state != MotionState::Off {
                assert!(svc.config().kind(ch).is_motion(), "{ch} moving as {:?}", svc.config().kind(ch));
            }
        }
    }
});
