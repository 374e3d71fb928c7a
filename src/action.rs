//! Action identifiers and their per-channel meaning.
//!
//! Action ids are plain integers split into a producer range and a
//! consumer range.  Each channel owns a contiguous slice of
//! [`ACTIONS_PER_CHANNEL`] ids in both ranges, so the mapping
//! channel ↔ id is pure arithmetic:
//!
//! ```text
//!   producer(ch, slot) = ch * 4 + slot                 0 ..  64
//!   consumer(ch, slot) = 64 + ch * 4 + slot           64 .. 128
//! ```
//!
//! What a slot means depends on the channel's [`ChannelKind`]; the typed
//! [`Produced`] and [`Command`] enums carry that meaning.

use crate::channel::{ChannelId, NUM_CHANNELS};
use crate::config::ChannelKind;

pub const ACTIONS_PER_CHANNEL: u8 = 4;
pub const NUM_PRODUCER_ACTIONS: u8 = NUM_CHANNELS as u8 * ACTIONS_PER_CHANNEL;
pub const NUM_CONSUMER_ACTIONS: u8 = NUM_CHANNELS as u8 * ACTIONS_PER_CHANNEL;
pub const NUM_ACTIONS: u8 = NUM_PRODUCER_ACTIONS + NUM_CONSUMER_ACTIONS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(pub u8);

impl ActionId {
    pub const fn producer(ch: ChannelId, slot: u8) -> Self {
        Self(ch.raw() * ACTIONS_PER_CHANNEL + slot % ACTIONS_PER_CHANNEL)
    }

    pub const fn consumer(ch: ChannelId, slot: u8) -> Self {
        Self(NUM_PRODUCER_ACTIONS + ch.raw() * ACTIONS_PER_CHANNEL + slot % ACTIONS_PER_CHANNEL)
    }

    pub const fn is_producer(self) -> bool {
        self.0 < NUM_PRODUCER_ACTIONS
    }

    pub const fn is_consumer(self) -> bool {
        self.0 >= NUM_PRODUCER_ACTIONS && self.0 < NUM_ACTIONS
    }

    /// Channel and slot of a consumer id; `None` outside the consumer range.
    pub fn decode_consumer(self) -> Option<(ChannelId, u8)> {
        if !self.is_consumer() {
            return None;
        }
        let rel = self.0 - NUM_PRODUCER_ACTIONS;
        let ch = ChannelId::new(rel / ACTIONS_PER_CHANNEL)?;
        Some((ch, rel % ACTIONS_PER_CHANNEL))
    }

    /// Channel and slot of a producer id; `None` outside the producer range.
    pub fn decode_producer(self) -> Option<(ChannelId, u8)> {
        if !self.is_producer() {
            return None;
        }
        let ch = ChannelId::new(self.0 / ACTIONS_PER_CHANNEL)?;
        Some((ch, self.0 % ACTIONS_PER_CHANNEL))
    }
}

/// One of the four Multi target positions (1-based, 1..=4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSlot(u8);

impl PositionSlot {
    pub const fn new(slot: u8) -> Option<Self> {
        if slot >= 1 && slot <= ACTIONS_PER_CHANNEL {
            Some(Self(slot))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Producer side
// ---------------------------------------------------------------------------

/// Debounced input edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEdge {
    OnToOff,
    OffToOn,
}

/// Servo / Bounce travel milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    ReachedOff,
    CrossedMid,
    ReachedOn,
}

/// Every event a channel can produce, tagged by the kind that produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Produced {
    Input(InputEdge),
    Servo(Milestone),
    AtPosition(PositionSlot),
}

impl Produced {
    /// Slot inside the channel's producer slice.
    pub const fn slot(self) -> u8 {
        match self {
            Self::Input(InputEdge::OnToOff) => 0,
            Self::Input(InputEdge::OffToOn) => 1,
            Self::Servo(Milestone::ReachedOff) => 0,
            Self::Servo(Milestone::CrossedMid) => 1,
            Self::Servo(Milestone::ReachedOn) => 2,
            Self::AtPosition(slot) => slot.get() - 1,
        }
    }

    /// Level carried on the bus with the event (ON vs OFF style event).
    pub const fn asserted(self) -> bool {
        !matches!(
            self,
            Self::Input(InputEdge::OnToOff) | Self::Servo(Milestone::ReachedOff)
        )
    }

    pub const fn action(self, ch: ChannelId) -> ActionId {
        ActionId::producer(ch, self.slot())
    }
}

// ---------------------------------------------------------------------------
// Consumer side
// ---------------------------------------------------------------------------

/// Digital output command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCommand {
    On,
    Flash,
    Off,
}

/// Servo / Bounce command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoCommand {
    Off,
    On,
}

/// An inbound command decoded against the channel's current kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Output(OutputCommand),
    Servo(ServoCommand),
    MoveTo(PositionSlot),
}

impl Command {
    /// Interpret a consumer slot for `kind`.  `None` when the slot means
    /// nothing for that kind.
    pub fn decode(kind: ChannelKind, slot: u8) -> Option<Self> {
        match kind {
            ChannelKind::Input => None,
            ChannelKind::Output => match slot {
                0 => Some(Self::Output(OutputCommand::On)),
                1 => Some(Self::Output(OutputCommand::Flash)),
                2 => Some(Self::Output(OutputCommand::Off)),
                _ => None,
            },
            ChannelKind::Servo | ChannelKind::Bounce => match slot {
                0 => Some(Self::Servo(ServoCommand::Off)),
                1 => Some(Self::Servo(ServoCommand::On)),
                _ => None,
            },
            ChannelKind::Multi => slot
                .checked_add(1)
                .and_then(PositionSlot::new)
                .map(Self::MoveTo),
        }
    }

    /// Slot inside the channel's consumer slice.
    pub const fn slot(self) -> u8 {
        match self {
            Self::Output(OutputCommand::On) => 0,
            Self::Output(OutputCommand::Flash) => 1,
            Self::Output(OutputCommand::Off) => 2,
            Self::Servo(ServoCommand::Off) => 0,
            Self::Servo(ServoCommand::On) => 1,
            Self::MoveTo(slot) => slot.get() - 1,
        }
    }

    pub const fn action(self, ch: ChannelId) -> ActionId {
        ActionId::consumer(ch, self.slot())
    }
}
