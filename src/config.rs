//! Module configuration: the read-only per-channel view.
//!
//! Each channel carries a [`ChannelConfig`] whose variant is its behavior
//! type and whose payload holds the parameters for that type.  The engines
//! never mutate this; they re-read it on every tick so a reconfiguration
//! between ticks takes effect immediately.
//!
//! Values are loaded and persisted through a
//! [`ConfigPort`](crate::app::ports::ConfigPort), which must call
//! [`ModuleConfig::validate`] before writing.

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelId, NUM_CHANNELS};
use crate::error::ConfigError;

/// Hardware timer ticks per millisecond (Fosc/4 with a 1:4 prescaler → 0.25 µs).
pub const TIMER_TICKS_PER_MS: u32 = 4_000;

/// Longest pulse the scheduler can generate without overlapping the next
/// block tick (5 ms).
pub const MAX_PULSE_TICKS: u32 = 5 * TIMER_TICKS_PER_MS;

/// Behavior type of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Input,
    Output,
    Servo,
    Bounce,
    Multi,
}

impl ChannelKind {
    /// Kinds driven by the motion engine and the pulse scheduler.
    pub const fn is_motion(self) -> bool {
        match self {
            Self::Servo | Self::Bounce | Self::Multi => true,
            Self::Input | Self::Output => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-type parameters
// ---------------------------------------------------------------------------

/// Digital input debounce and event options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputParams {
    /// Consecutive asserted polls required to confirm a rising edge.
    pub on_delay: u8,
    /// Consecutive deasserted polls required to confirm a falling edge.
    pub off_delay: u8,
    /// Swap the meaning of asserted/deasserted for event selection.
    pub inverted: bool,
    /// Emit the on→off producer action as well as off→on.
    pub off_events: bool,
}

impl Default for InputParams {
    fn default() -> Self {
        Self {
            on_delay: 4,
            off_delay: 4,
            inverted: false,
            off_events: true,
        }
    }
}

/// Digital output options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputParams {
    /// Drive the pin low for "on".
    pub inverted: bool,
    /// Flash half-period, in 20 ms motion ticks.
    pub flash_ticks: u8,
}

impl Default for OutputParams {
    fn default() -> Self {
        Self {
            inverted: false,
            flash_ticks: 25, // 500 ms on, 500 ms off
        }
    }
}

/// End positions and travel speeds for Servo and Bounce channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoParams {
    /// Position for "off".
    pub start_pos: u8,
    /// Position for "on".
    pub end_pos: u8,
    /// Position units per 20 ms tick travelling start → end.
    pub on_speed: u8,
    /// Position units per 20 ms tick travelling end → start.
    pub off_speed: u8,
}

impl ServoParams {
    /// Average of the two end positions.
    pub const fn midpoint(&self) -> u8 {
        ((self.start_pos as u16 + self.end_pos as u16) / 2) as u8
    }

    /// Distance of the bounce rebound: an eighth of the travel, at least 1
    /// unless the end positions coincide.
    pub const fn rebound_amplitude(&self) -> u8 {
        let travel = self.start_pos.abs_diff(self.end_pos);
        if travel == 0 {
            0
        } else if travel < 8 {
            1
        } else {
            travel / 8
        }
    }
}

impl Default for ServoParams {
    fn default() -> Self {
        Self {
            start_pos: 64,
            end_pos: 192,
            on_speed: 2,
            off_speed: 2,
        }
    }
}

/// Up to four target positions for Multi channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiParams {
    pub positions: [u8; 4],
    /// How many of `positions` are in use (0–4).
    pub count: u8,
}

impl MultiParams {
    /// Position for a 1-based slot, gated by `count`.
    pub fn position(&self, slot: u8) -> Option<u8> {
        if slot == 0 || slot > self.count {
            return None;
        }
        self.positions.get(slot as usize - 1).copied()
    }
}

impl Default for MultiParams {
    fn default() -> Self {
        Self {
            positions: [0, 85, 170, 255],
            count: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Channel record
// ---------------------------------------------------------------------------

/// Configuration of one channel: its behavior type and that type's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelConfig {
    Input(InputParams),
    Output(OutputParams),
    Servo(ServoParams),
    Bounce(ServoParams),
    Multi(MultiParams),
}

impl ChannelConfig {
    pub const fn kind(&self) -> ChannelKind {
        match self {
            Self::Input(_) => ChannelKind::Input,
            Self::Output(_) => ChannelKind::Output,
            Self::Servo(_) => ChannelKind::Servo,
            Self::Bounce(_) => ChannelKind::Bounce,
            Self::Multi(_) => ChannelKind::Multi,
        }
    }

    /// Factory parameters for a freshly selected type.
    pub fn default_for(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Input => Self::Input(InputParams::default()),
            ChannelKind::Output => Self::Output(OutputParams::default()),
            ChannelKind::Servo => Self::Servo(ServoParams::default()),
            ChannelKind::Bounce => Self::Bounce(ServoParams::default()),
            ChannelKind::Multi => Self::Multi(MultiParams::default()),
        }
    }

    /// End positions and speeds, for the two kinds that have them.
    pub const fn servo(&self) -> Option<&ServoParams> {
        match self {
            Self::Servo(p) | Self::Bounce(p) => Some(p),
            _ => None,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::default_for(ChannelKind::Input)
    }
}

// ---------------------------------------------------------------------------
// Pulse timing
// ---------------------------------------------------------------------------

/// Linear map from an 8-bit position to a pulse width in timer ticks.
///
/// `ticks = offset + multiplier * position`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseTiming {
    pub offset: u16,
    pub multiplier: u16,
}

impl PulseTiming {
    pub const fn ticks_for(&self, position: u8) -> u16 {
        self.offset
            .saturating_add(self.multiplier.saturating_mul(position as u16))
    }

    pub const fn min_ticks(&self) -> u16 {
        self.ticks_for(0)
    }

    pub const fn max_ticks(&self) -> u16 {
        self.ticks_for(u8::MAX)
    }
}

impl Default for PulseTiming {
    /// 0.90 ms at position 0, 2.05 ms at position 255.
    fn default() -> Self {
        Self {
            offset: 3600,
            multiplier: 18,
        }
    }
}

// ---------------------------------------------------------------------------
// Module configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub channels: [ChannelConfig; NUM_CHANNELS],
    /// Travel speed shared by every Multi channel.
    pub multi_speed: u8,
    pub pulse: PulseTiming,
    /// Input scan interval (milliseconds).
    pub scan_interval_ms: u32,
}

impl ModuleConfig {
    pub fn channel(&self, ch: ChannelId) -> &ChannelConfig {
        &self.channels[ch.index()]
    }

    pub fn kind(&self, ch: ChannelId) -> ChannelKind {
        self.channel(ch).kind()
    }

    /// Replace a channel's record.
    pub fn set_channel(&mut self, ch: ChannelId, config: ChannelConfig) {
        self.channels[ch.index()] = config;
    }

    /// Range-check every field.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.scan_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "scan_interval_ms must be 1–100",
            ));
        }
        if self.pulse.offset == 0 {
            return Err(ConfigError::ValidationFailed("pulse.offset must be > 0"));
        }
        if self.pulse.multiplier == 0 {
            return Err(ConfigError::ValidationFailed(
                "pulse.multiplier must be > 0",
            ));
        }
        let max = self.pulse.offset as u32 + self.pulse.multiplier as u32 * u8::MAX as u32;
        if max >= MAX_PULSE_TICKS {
            return Err(ConfigError::ValidationFailed(
                "pulse width at position 255 must be < 5 ms",
            ));
        }
        for channel in &self.channels {
            match channel {
                ChannelConfig::Multi(m) if m.count > 4 => {
                    return Err(ConfigError::ValidationFailed("multi count must be 0–4"));
                }
                ChannelConfig::Output(o) if o.flash_ticks == 0 => {
                    return Err(ConfigError::ValidationFailed(
                        "output flash_ticks must be > 0",
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            channels: [ChannelConfig::default(); NUM_CHANNELS],
            multi_speed: 2,
            pulse: PulseTiming::default(),
            scan_interval_ms: 5,
        }
    }
}
