//! Port traits: the boundary between the channel engines and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ engines / ChannelService
//! ```
//!
//! Driven adapters (pins, timers, event bus, storage) implement these
//! traits.  The engines consume them via generics, so the real-time core
//! never touches registers directly and runs unchanged against the
//! recording mocks in the test suite.

use crate::action::ActionId;
use crate::channel::{ChannelId, TimerId};
use crate::config::ModuleConfig;

pub use crate::error::{ConfigError, StorageError};

// ───────────────────────────────────────────────────────────────
// Pin port (hardware ↔ loop)
// ───────────────────────────────────────────────────────────────

/// Raw level access to the 16 I/O pins from loop context.
pub trait PinPort {
    /// Current electrical level (true = high).
    fn read_level(&mut self, ch: ChannelId) -> bool;

    /// Drive a pin configured as an output.
    fn write_level(&mut self, ch: ChannelId, high: bool);
}

// ───────────────────────────────────────────────────────────────
// Pulse hardware (owned by the scheduler, reached from ISRs)
// ───────────────────────────────────────────────────────────────

/// The four one-shot timers plus the pin writes they gate.
///
/// Every method may be called from interrupt context and must complete in
/// bounded time without blocking.
pub trait PulseHardware {
    /// Load `count` native ticks and enable the timer.
    fn start_timer(&mut self, timer: TimerId, count: u16);

    /// Load the next native period of a running timer.
    fn reload_timer(&mut self, timer: TimerId, count: u16);

    /// Disable the timer.
    fn stop_timer(&mut self, timer: TimerId);

    /// Drive the pulse output of a motion channel.
    fn set_pulse_pin(&mut self, ch: ChannelId, high: bool);
}

// ───────────────────────────────────────────────────────────────
// Event bus (domain → network)
// ───────────────────────────────────────────────────────────────

/// Whether a learned binding produces or consumes an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Produced,
    Consumed,
}

/// Outbound events and the learned-binding table behind them.
///
/// The mapping of action ids to network events lives on the other side of
/// this trait; the engines only ever speak in [`ActionId`]s.
pub trait EventBus {
    /// Send the network event bound to `action`, if any.
    fn emit_producer_action(&mut self, action: ActionId, asserted: bool);

    /// Learn a default binding for `action` on `ch`.
    fn register_binding(&mut self, ch: ChannelId, kind: BindingKind, action: ActionId);

    /// Forget every binding of every action in `ch`'s slices.
    fn clear_bindings(&mut self, ch: ChannelId);
}

// ───────────────────────────────────────────────────────────────
// Output store (domain ↔ persisted output values)
// ───────────────────────────────────────────────────────────────

/// Last committed output value per channel.
///
/// For motion channels the value is a position, for digital outputs it is
/// 0 (off) or 1 (on).
pub trait OutputStore {
    fn load(&self, ch: ChannelId) -> Option<u8>;

    fn commit(&mut self, ch: ChannelId, value: u8);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the module configuration.
///
/// Implementations MUST call [`ModuleConfig::validate`] before persisting
/// and reject invalid values rather than clamp them.
pub trait ConfigPort {
    /// Returns [`ModuleConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<ModuleConfig, ConfigError>;

    fn save(&self, config: &ModuleConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (domain ↔ EEPROM / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Keys are namespaced.  Writes MUST be atomic, with no partial writes on
/// power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}
