//! Position interpolation and milestone events for Servo, Bounce and Multi
//! channels.
//!
//! ```text
//!            move_to_*            current == target
//!   ┌─────┐ ─────────▶ ┌────────┐ ─────────────────▶ ┌─────────┐
//!   │ Off │            │ Moving │                    │ Stopped │
//!   └─────┘ ◀───┐      └────────┘ ◀───────────────── └─────────┘
//!               │                    move_to_*            │
//!               └──────────────── ≥ 1 s idle ─────────────┘
//! ```
//!
//! `tick()` runs every 20 ms.  A moving channel steps toward its target by
//! its speed, clamped so it never overshoots.  The scheduler only generates
//! pulses for channels that are not `Off`, so a settled actuator goes limp
//! a second after it arrives.

use log::debug;

use crate::action::{Milestone, PositionSlot, Produced};
use crate::app::ports::{EventBus, OutputStore};
use crate::channel::{ChannelId, NUM_CHANNELS};
use crate::config::{ChannelConfig, ChannelKind, ModuleConfig, ServoParams};
use crate::ticks::Millis;

/// Idle time after arrival before pulses stop.
pub const SETTLE_TIMEOUT_MS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    /// No pulses are generated.
    Off,
    /// At the target, still pulsing to hold position.
    Stopped,
    Moving,
}

/// Producer events still owed by the current move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventFlags {
    pub on: bool,
    pub off: bool,
    pub mid: bool,
}

/// Bounce rebound phase after reaching the start position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rebound {
    Idle,
    Out,
    Back,
}

#[derive(Debug, Clone, Copy)]
pub struct ServoChannel {
    pub state: MotionState,
    pub current_pos: u8,
    pub target_pos: u8,
    /// Position units per tick; 0 jumps straight to the target.
    pub speed: u8,
    pub events: EventFlags,
    slot: Option<PositionSlot>,
    /// Kind the current move was issued under.
    issued: ChannelKind,
    rebound: Rebound,
    stopped_at: Millis,
}

impl ServoChannel {
    const fn new() -> Self {
        Self {
            state: MotionState::Off,
            current_pos: 0,
            target_pos: 0,
            speed: 0,
            events: EventFlags { on: false, off: false, mid: false },
            slot: None,
            issued: ChannelKind::Input,
            rebound: Rebound::Idle,
            stopped_at: Millis::ZERO,
        }
    }

    /// Next position one tick toward the target.
    fn step(&self) -> u8 {
        let (from, to) = (self.current_pos, self.target_pos);
        if self.speed == 0 {
            return to;
        }
        if from < to {
            (from as u16 + self.speed as u16).min(to as u16) as u8
        } else {
            from.saturating_sub(self.speed).max(to)
        }
    }
}

pub struct MotionEngine {
    channels: [ServoChannel; NUM_CHANNELS],
}

impl MotionEngine {
    pub fn new() -> Self {
        Self {
            channels: [ServoChannel::new(); NUM_CHANNELS],
        }
    }

    /// Start-up: every channel `Off`, parked at its last committed position.
    ///
    /// Without a stored value a channel parks at its start position
    /// (Servo/Bounce), its first position (Multi) or 0.
    pub fn restore(&mut self, config: &ModuleConfig, store: &impl OutputStore) {
        for ch in ChannelId::all() {
            let fallback = match config.channel(ch) {
                ChannelConfig::Servo(p) | ChannelConfig::Bounce(p) => p.start_pos,
                ChannelConfig::Multi(m) => m.positions[0],
                ChannelConfig::Input(_) | ChannelConfig::Output(_) => 0,
            };
            let pos = store.load(ch).unwrap_or(fallback);
            self.channels[ch.index()] = ServoChannel {
                current_pos: pos,
                target_pos: pos,
                ..ServoChannel::new()
            };
        }
    }

    // ── Commands ──────────────────────────────────────────────

    /// Travel to the start position (Servo / Bounce).
    pub fn move_to_off(&mut self, ch: ChannelId, config: &ModuleConfig) {
        let Some(p) = config.channel(ch).servo() else {
            debug!("{ch}: move_to_off ignored for {:?}", config.kind(ch));
            return;
        };
        let flags = EventFlags { on: false, off: true, mid: true };
        self.start_move(ch, config.kind(ch), p.start_pos, p.off_speed, flags, None);
    }

    /// Travel to the end position (Servo / Bounce).
    pub fn move_to_on(&mut self, ch: ChannelId, config: &ModuleConfig) {
        let Some(p) = config.channel(ch).servo() else {
            debug!("{ch}: move_to_on ignored for {:?}", config.kind(ch));
            return;
        };
        let flags = EventFlags { on: true, off: false, mid: true };
        self.start_move(ch, config.kind(ch), p.end_pos, p.on_speed, flags, None);
    }

    /// Travel to one of a Multi channel's configured positions.
    pub fn move_to_position(&mut self, ch: ChannelId, slot: PositionSlot, config: &ModuleConfig) {
        let ChannelConfig::Multi(m) = config.channel(ch) else {
            debug!("{ch}: move_to_position ignored for {:?}", config.kind(ch));
            return;
        };
        let Some(target) = m.position(slot.get()) else {
            debug!("{ch}: position {} not configured (count {})", slot.get(), m.count);
            return;
        };
        let flags = EventFlags { on: true, off: false, mid: false };
        self.start_move(ch, ChannelKind::Multi, target, config.multi_speed, flags, Some(slot));
    }

    fn start_move(
        &mut self,
        ch: ChannelId,
        issued: ChannelKind,
        target: u8,
        speed: u8,
        events: EventFlags,
        slot: Option<PositionSlot>,
    ) {
        let c = &mut self.channels[ch.index()];
        c.target_pos = target;
        c.speed = speed;
        c.events = events;
        c.slot = slot;
        c.issued = issued;
        c.rebound = Rebound::Idle;
        c.state = MotionState::Moving;
        debug!("{ch}: moving {} -> {target} at {speed}", c.current_pos);
    }

    /// Force a channel `Off` and drop any pending events.
    pub fn halt(&mut self, ch: ChannelId) {
        let c = &mut self.channels[ch.index()];
        c.state = MotionState::Off;
        c.events = EventFlags::default();
        c.slot = None;
        c.rebound = Rebound::Idle;
    }

    // ── 20 ms tick ────────────────────────────────────────────

    pub fn tick(
        &mut self,
        config: &ModuleConfig,
        now: Millis,
        bus: &mut impl EventBus,
        store: &mut impl OutputStore,
    ) {
        for ch in ChannelId::all() {
            let kind = config.kind(ch);
            let c = &self.channels[ch.index()];
            if c.state != MotionState::Off && (!kind.is_motion() || c.issued != kind) {
                debug!("{ch}: retyped to {kind:?} while powered, halting");
                self.halt(ch);
                continue;
            }
            match self.channels[ch.index()].state {
                MotionState::Off => {}
                MotionState::Stopped => {
                    let c = &mut self.channels[ch.index()];
                    if now.since(c.stopped_at) >= SETTLE_TIMEOUT_MS {
                        c.state = MotionState::Off;
                        debug!("{ch}: settled, pulses off");
                    }
                }
                MotionState::Moving => self.advance(ch, config, now, bus, store),
            }
        }
    }

    fn advance(
        &mut self,
        ch: ChannelId,
        config: &ModuleConfig,
        now: Millis,
        bus: &mut impl EventBus,
        store: &mut impl OutputStore,
    ) {
        let channel_config = config.channel(ch);
        let c = &mut self.channels[ch.index()];
        let from = c.current_pos;
        let next = c.step();

        let mid = channel_config.servo().map(ServoParams::midpoint);
        if let Some(mid) = mid.filter(|_| c.events.mid) {
            if (from < mid && next >= mid) || (from > mid && next <= mid) {
                c.events.mid = false;
                emit(bus, ch, Produced::Servo(Milestone::CrossedMid));
            }
        }

        c.current_pos = next;
        if next != c.target_pos {
            return;
        }

        match c.rebound {
            Rebound::Idle => {
                let events = c.events;
                c.events = EventFlags::default();
                if events.on {
                    match c.slot {
                        Some(slot) => emit(bus, ch, Produced::AtPosition(slot)),
                        None => emit(bus, ch, Produced::Servo(Milestone::ReachedOn)),
                    }
                } else if events.off {
                    emit(bus, ch, Produced::Servo(Milestone::ReachedOff));
                }

                let rebound = match channel_config {
                    ChannelConfig::Bounce(p) if events.off && p.rebound_amplitude() > 0 => Some(p),
                    _ => None,
                };
                if let Some(p) = rebound {
                    let amp = p.rebound_amplitude();
                    c.target_pos = if p.end_pos > p.start_pos {
                        p.start_pos.saturating_add(amp)
                    } else {
                        p.start_pos.saturating_sub(amp)
                    };
                    c.speed = p.off_speed;
                    c.rebound = Rebound::Out;
                    return;
                }
            }
            Rebound::Out => {
                if let Some(p) = channel_config.servo() {
                    c.target_pos = p.start_pos;
                    c.rebound = Rebound::Back;
                    return;
                }
                c.rebound = Rebound::Idle;
            }
            Rebound::Back => c.rebound = Rebound::Idle,
        }

        c.state = MotionState::Stopped;
        c.stopped_at = now;
        store.commit(ch, c.current_pos);
        debug!("{ch}: stopped at {}", c.current_pos);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn channel(&self, ch: ChannelId) -> &ServoChannel {
        &self.channels[ch.index()]
    }

    /// Position to pulse for, or `None` while the channel is `Off`.
    pub fn pulse_position(&self, ch: ChannelId) -> Option<u8> {
        let c = &self.channels[ch.index()];
        match c.state {
            MotionState::Off => None,
            MotionState::Stopped | MotionState::Moving => Some(c.current_pos),
        }
    }
}

impl Default for MotionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn emit(bus: &mut impl EventBus, ch: ChannelId, produced: Produced) {
    debug!("{ch}: {produced:?}");
    bus.emit_producer_action(produced.action(ch), produced.asserted());
}
