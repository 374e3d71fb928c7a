//! Pulse scheduler: 4 one-shot timers multiplexed over 16 channels.
//!
//! Every 5 ms the active block advances by one.  Each timer serves the
//! channel at its offset in that block: the pin is driven high and the
//! timer started for the pulse width of the channel's current position.
//! When the timer expires (interrupt context) the pin is dropped.
//!
//! ```text
//!   t (ms)    0     5     10    15    20    25
//!   block     0     1     2     3     0     1   ...
//!
//!   timer 0  ┌┐    ┌┐    ┌┐    ┌┐    ┌┐          ch 0, 4, 8, 12
//!            ┘└────┘└────┘└────┘└────┘└───
//!              ◀─▶ 0.90 .. 2.05 ms
//! ```
//!
//! Every channel therefore gets one pulse per 20 ms frame.
//!
//! ## Narrow timers
//!
//! Timers 1 and 3 only count 8 bits natively.  [`WideOneShot`] splits the
//! interval into a native low byte plus a software high byte that is
//! decremented on every native expiry:
//!
//! ```text
//!   ticks = 0x1C20   ──▶  first = 0x20, then 0x1C × 256
//!   ticks = 0x1C00   ──▶  first = 256,  then 0x1B × 256
//! ```
//!
//! All shared state lives behind a critical-section mutex so the loop and
//! the expiry interrupt never observe a half-armed slot.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::app::ports::PulseHardware;
use crate::channel::{BlockId, ChannelId, NUM_TIMERS, TimerId, TimerWidth};
use crate::config::ModuleConfig;
use crate::motion::MotionEngine;

/// Interval between block advances.
pub const BLOCK_PERIOD_MS: u32 = 5;
/// Interval between motion ticks (one full sweep of the 4 blocks).
pub const MOTION_PERIOD_MS: u32 = 20;

/// Full native period of a narrow timer.
const NARROW_PERIOD: u16 = 256;

// ═══════════════════════════════════════════════════════════════
//  One-shot slot
// ═══════════════════════════════════════════════════════════════

/// What the expiry handler did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// More native periods remain; the timer was reloaded.
    Reload(u16),
    /// The pulse is complete; the timer is stopped and the pin low.
    Done(ChannelId),
    /// Spurious expiry with nothing armed.
    Idle,
}

/// Per-timer pulse bookkeeping, shared by both timer widths.
#[derive(Debug, Clone, Copy, Default)]
pub struct WideOneShot {
    /// Channel whose pin is high, if a pulse is running.
    channel: Option<ChannelId>,
    /// Native periods still to run after the current one.
    remaining: u8,
}

impl WideOneShot {
    /// Arm for `ticks`; returns the count to load first.
    pub fn arm(&mut self, ch: ChannelId, width: TimerWidth, ticks: u16) -> u16 {
        self.channel = Some(ch);
        match width {
            TimerWidth::Wide => {
                self.remaining = 0;
                ticks
            }
            TimerWidth::Narrow => {
                let low = ticks & 0xFF;
                let high = (ticks >> 8) as u8;
                if low == 0 && high > 0 {
                    self.remaining = high - 1;
                    NARROW_PERIOD
                } else {
                    self.remaining = high;
                    low
                }
            }
        }
    }

    /// Account for one native expiry.
    pub fn expire(&mut self) -> Expiry {
        let Some(ch) = self.channel else {
            return Expiry::Idle;
        };
        if self.remaining == 0 {
            self.channel = None;
            Expiry::Done(ch)
        } else {
            self.remaining -= 1;
            Expiry::Reload(NARROW_PERIOD)
        }
    }

    /// Drop a running pulse; returns the channel that was armed.
    pub fn cancel(&mut self) -> Option<ChannelId> {
        self.remaining = 0;
        self.channel.take()
    }

    pub fn armed(&self) -> Option<ChannelId> {
        self.channel
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

struct PulseShared<H> {
    active_block: BlockId,
    slots: [WideOneShot; NUM_TIMERS],
    hw: H,
}

pub struct PulseScheduler<H: PulseHardware> {
    shared: Mutex<CriticalSectionRawMutex, RefCell<PulseShared<H>>>,
}

impl<H: PulseHardware> PulseScheduler<H> {
    /// The first `advance_block` activates block 0.
    pub const fn new(hw: H) -> Self {
        Self {
            shared: Mutex::new(RefCell::new(PulseShared {
                active_block: BlockId::LAST,
                slots: [WideOneShot {
                    channel: None,
                    remaining: 0,
                }; NUM_TIMERS],
                hw,
            })),
        }
    }

    /// Block tick: activate the next block and arm its motion channels.
    ///
    /// A channel is armed only if its kind is a motion kind and its motion
    /// state is not `Off`.  Pulse widths are computed before the critical
    /// section; inside it a pulse still running from the previous block is
    /// terminated first.
    pub fn advance_block(&self, config: &ModuleConfig, motion: &MotionEngine) -> BlockId {
        let block = self.active_block().next();
        let mut pending = [None; NUM_TIMERS];
        for timer in TimerId::all() {
            let ch = block.channel(timer);
            if !config.kind(ch).is_motion() {
                continue;
            }
            pending[timer.index()] = motion
                .pulse_position(ch)
                .map(|pos| (ch, config.pulse.ticks_for(pos)));
        }

        self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            let PulseShared { active_block, slots, hw } = &mut *shared;
            *active_block = block;

            for timer in TimerId::all() {
                let slot = &mut slots[timer.index()];
                if let Some(stale) = slot.cancel() {
                    hw.stop_timer(timer);
                    hw.set_pulse_pin(stale, false);
                }
                if let Some((ch, ticks)) = pending[timer.index()] {
                    let count = slot.arm(ch, timer.width(), ticks);
                    hw.set_pulse_pin(ch, true);
                    hw.start_timer(timer, count);
                }
            }
        });
        block
    }

    /// Expiry handler for `timer`.  Call from the timer's interrupt.
    pub fn on_timer_expired(&self, timer: TimerId) -> Expiry {
        self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            let PulseShared { slots, hw, .. } = &mut *shared;
            let expiry = slots[timer.index()].expire();
            match expiry {
                Expiry::Reload(count) => hw.reload_timer(timer, count),
                Expiry::Done(ch) => {
                    hw.stop_timer(timer);
                    hw.set_pulse_pin(ch, false);
                }
                Expiry::Idle => hw.stop_timer(timer),
            }
            expiry
        })
    }

    pub fn active_block(&self) -> BlockId {
        self.shared.lock(|cell| cell.borrow().active_block)
    }

    /// Channel currently pulsing on `timer`.
    pub fn armed(&self, timer: TimerId) -> Option<ChannelId> {
        self.shared.lock(|cell| cell.borrow().slots[timer.index()].armed())
    }

    /// Run `f` against the owned hardware inside the critical section.
    pub fn with_hardware<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        self.shared.lock(|cell| f(&mut cell.borrow_mut().hw))
    }
}
