//! Inbound action routing and default event bindings.
//!
//! ```text
//!   ActionId ──▶ decode_consumer ──▶ (channel, slot)
//!                                         │  kind from config
//!                                         ▼
//!                                    Command::decode
//!                 ┌──────────────────────┼───────────────────────┐
//!                 ▼                      ▼                       ▼
//!          OutputDriver::apply   move_to_on / move_to_off   move_to_position
//! ```
//!
//! Ids outside the consumer range, Input channels and slots with no
//! meaning for the channel's kind are dropped.

use heapless::Vec;
use log::debug;

use crate::action::{ActionId, Command, InputEdge, OutputCommand, Produced, ServoCommand};
use crate::app::ports::{BindingKind, EventBus, OutputStore, PinPort};
use crate::channel::ChannelId;
use crate::config::{ChannelConfig, ChannelKind, ModuleConfig};
use crate::motion::MotionEngine;
use crate::outputs::OutputDriver;

/// Most default bindings any kind registers.
pub const MAX_DEFAULT_BINDINGS: usize = 2;

/// Route a consumer action to the engine that owns its channel.
pub fn dispatch(
    action: ActionId,
    config: &ModuleConfig,
    motion: &mut MotionEngine,
    outputs: &mut OutputDriver,
    pins: &mut impl PinPort,
    store: &mut impl OutputStore,
) {
    let Some((ch, slot)) = action.decode_consumer() else {
        debug!("action {} is not a consumer action", action.0);
        return;
    };
    let channel = config.channel(ch);
    let Some(command) = Command::decode(channel.kind(), slot) else {
        debug!("{ch}: slot {slot} means nothing for {:?}", channel.kind());
        return;
    };

    match (command, channel) {
        (Command::Output(cmd), ChannelConfig::Output(params)) => {
            outputs.apply(ch, cmd, params, pins, store);
        }
        (Command::Servo(ServoCommand::On), _) => motion.move_to_on(ch, config),
        (Command::Servo(ServoCommand::Off), _) => motion.move_to_off(ch, config),
        (Command::MoveTo(slot), _) => motion.move_to_position(ch, slot, config),
        (Command::Output(_), _) => {}
    }
}

/// The bindings a channel of `kind` starts out with.
pub fn default_bindings(ch: ChannelId, kind: ChannelKind) -> Vec<(BindingKind, ActionId), MAX_DEFAULT_BINDINGS> {
    let pair = match kind {
        ChannelKind::Input => [
            (BindingKind::Produced, Produced::Input(InputEdge::OnToOff).action(ch)),
            (BindingKind::Produced, Produced::Input(InputEdge::OffToOn).action(ch)),
        ],
        ChannelKind::Output => [
            (BindingKind::Consumed, Command::Output(OutputCommand::On).action(ch)),
            (BindingKind::Consumed, Command::Output(OutputCommand::Off).action(ch)),
        ],
        ChannelKind::Servo | ChannelKind::Bounce => [
            (BindingKind::Consumed, Command::Servo(ServoCommand::On).action(ch)),
            (BindingKind::Consumed, Command::Servo(ServoCommand::Off).action(ch)),
        ],
        ChannelKind::Multi => return Vec::new(),
    };
    Vec::from_slice(&pair).unwrap_or_default()
}

/// Forget a channel's bindings and register the defaults for `kind`.
pub fn reset_channel_defaults(ch: ChannelId, kind: ChannelKind, bus: &mut impl EventBus) {
    bus.clear_bindings(ch);
    for (binding, action) in default_bindings(ch, kind) {
        bus.register_binding(ch, binding, action);
    }
    debug!("{ch}: default bindings for {kind:?}");
}

/// [`reset_channel_defaults`] for every channel, using its configured kind.
pub fn reset_all_defaults(config: &ModuleConfig, bus: &mut impl EventBus) {
    for ch in ChannelId::all() {
        reset_channel_defaults(ch, config.kind(ch), bus);
    }
}
