//! Mock adapters for integration tests.
//!
//! Every port call is recorded so tests can assert on the full history
//! without touching real pins or timers.

use iochan::action::ActionId;
use iochan::app::ports::{BindingKind, EventBus, OutputStore, PinPort, PulseHardware};
use iochan::app::service::ChannelService;
use iochan::channel::{ChannelId, NUM_CHANNELS, TimerId};
use iochan::config::ModuleConfig;
use iochan::scheduler::PulseScheduler;
use iochan::ticks::Millis;

// ── Pins ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockPins {
    pub levels: [bool; NUM_CHANNELS],
    pub writes: Vec<(ChannelId, bool)>,
}

impl PinPort for MockPins {
    fn read_level(&mut self, ch: ChannelId) -> bool {
        self.levels[ch.index()]
    }

    fn write_level(&mut self, ch: ChannelId, high: bool) {
        self.levels[ch.index()] = high;
        self.writes.push((ch, high));
    }
}

// ── Event bus ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emitted {
    pub at: Millis,
    pub action: ActionId,
    pub asserted: bool,
}

#[derive(Debug, Default)]
pub struct MockBus {
    pub now: Millis,
    pub emitted: Vec<Emitted>,
    pub bindings: Vec<(ChannelId, BindingKind, ActionId)>,
    pub clears: Vec<ChannelId>,
}

#[allow(dead_code)]
impl MockBus {
    pub fn actions(&self) -> Vec<(ActionId, bool)> {
        self.emitted.iter().map(|e| (e.action, e.asserted)).collect()
    }

    pub fn count(&self, action: ActionId) -> usize {
        self.emitted.iter().filter(|e| e.action == action).count()
    }
}

impl EventBus for MockBus {
    fn emit_producer_action(&mut self, action: ActionId, asserted: bool) {
        self.emitted.push(Emitted { at: self.now, action, asserted });
    }

    fn register_binding(&mut self, ch: ChannelId, kind: BindingKind, action: ActionId) {
        self.bindings.push((ch, kind, action));
    }

    fn clear_bindings(&mut self, ch: ChannelId) {
        self.clears.push(ch);
        self.bindings.retain(|b| b.0 != ch);
    }
}

// ── Output store ──────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockStore {
    pub values: [Option<u8>; NUM_CHANNELS],
    pub commits: usize,
}

impl OutputStore for MockStore {
    fn load(&self, ch: ChannelId) -> Option<u8> {
        self.values[ch.index()]
    }

    fn commit(&mut self, ch: ChannelId, value: u8) {
        self.values[ch.index()] = Some(value);
        self.commits += 1;
    }
}

// ── Pulse hardware ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCall {
    Start { timer: usize, count: u16 },
    Reload { timer: usize, count: u16 },
    Stop { timer: usize },
    Pin { ch: u8, high: bool },
}

#[derive(Debug, Default)]
pub struct MockPulseHw {
    pub calls: Vec<TimerCall>,
    pub pin_high: [bool; NUM_CHANNELS],
    /// Completed pulses: channel and total native ticks.
    pub pulses: Vec<(u8, u32)>,
    running: [Option<(u8, u32)>; 4],
}

impl PulseHardware for MockPulseHw {
    fn start_timer(&mut self, timer: TimerId, count: u16) {
        self.calls.push(TimerCall::Start { timer: timer.index(), count });
        let ch = self
            .calls
            .iter()
            .rev()
            .find_map(|c| match c {
                TimerCall::Pin { ch, high: true } => Some(*ch),
                _ => None,
            })
            .unwrap_or(u8::MAX);
        self.running[timer.index()] = Some((ch, count as u32));
    }

    fn reload_timer(&mut self, timer: TimerId, count: u16) {
        self.calls.push(TimerCall::Reload { timer: timer.index(), count });
        if let Some((_, total)) = &mut self.running[timer.index()] {
            *total += count as u32;
        }
    }

    fn stop_timer(&mut self, timer: TimerId) {
        self.calls.push(TimerCall::Stop { timer: timer.index() });
        if let Some(done) = self.running[timer.index()].take() {
            self.pulses.push(done);
        }
    }

    fn set_pulse_pin(&mut self, ch: ChannelId, high: bool) {
        self.calls.push(TimerCall::Pin { ch: ch.raw(), high });
        self.pin_high[ch.index()] = high;
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// A service wired to mocks with a 1 ms simulated clock.
pub struct Rig {
    pub service: ChannelService,
    pub pins: MockPins,
    pub bus: MockBus,
    pub store: MockStore,
    pub pulses: PulseScheduler<MockPulseHw>,
    pub now: Millis,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: ModuleConfig) -> Self {
        Self::with_store(config, MockStore::default())
    }

    pub fn with_store(config: ModuleConfig, store: MockStore) -> Self {
        let mut rig = Self {
            service: ChannelService::new(config),
            pins: MockPins::default(),
            bus: MockBus::default(),
            store,
            pulses: PulseScheduler::new(MockPulseHw::default()),
            now: Millis::ZERO,
        };
        rig.service.start(rig.now, &mut rig.pins, &rig.store);
        rig
    }

    /// Advance the clock `ms` milliseconds, polling once per millisecond.
    /// Every armed pulse completes within the millisecond it started.
    pub fn run_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.now = self.now.after(1);
            self.bus.now = self.now;
            self.service.poll(
                self.now,
                &mut self.pins,
                &mut self.bus,
                &mut self.store,
                &self.pulses,
            );
            self.expire_all();
        }
    }

    /// Deliver timer interrupts until no timer is armed.
    pub fn expire_all(&mut self) {
        for timer in TimerId::all() {
            while self.pulses.armed(timer).is_some() {
                self.pulses.on_timer_expired(timer);
            }
        }
    }

    pub fn send(&mut self, action: ActionId) {
        self.service.handle_action(action, &mut self.pins, &mut self.store);
    }

    pub fn set_input(&mut self, ch: ChannelId, high: bool) {
        self.pins.levels[ch.index()] = high;
    }

    /// Completed pulses for `ch`, in native ticks.
    pub fn pulses_for(&self, ch: ChannelId) -> Vec<u32> {
        self.pulses.with_hardware(|hw| {
            hw.pulses
                .iter()
                .filter(|p| p.0 == ch.raw())
                .map(|p| p.1)
                .collect()
        })
    }
}

pub fn ch(i: u8) -> ChannelId {
    ChannelId::new(i).unwrap()
}
