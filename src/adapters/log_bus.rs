//! Log-based event bus adapter.
//!
//! Implements [`EventBus`] by writing every producer event and binding
//! change to the logger.  A network adapter implements the same trait.

use log::info;

use crate::action::ActionId;
use crate::app::ports::{BindingKind, EventBus};
use crate::channel::ChannelId;

/// Adapter that logs every event to the serial console.
pub struct LogEventBus {
    emitted: u32,
}

impl LogEventBus {
    pub fn new() -> Self {
        Self { emitted: 0 }
    }

    /// Producer events logged so far.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl Default for LogEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for LogEventBus {
    fn emit_producer_action(&mut self, action: ActionId, asserted: bool) {
        self.emitted = self.emitted.wrapping_add(1);
        match action.decode_producer() {
            Some((ch, slot)) => info!(
                "EVENT | {ch} slot={slot} action={} {}",
                action.0,
                if asserted { "ON" } else { "OFF" }
            ),
            None => info!("EVENT | action={} (not a producer id)", action.0),
        }
    }

    fn register_binding(&mut self, ch: ChannelId, kind: BindingKind, action: ActionId) {
        info!("BIND  | {ch} {kind:?} action={}", action.0);
    }

    fn clear_bindings(&mut self, ch: ChannelId) {
        info!("BIND  | {ch} cleared");
    }
}
