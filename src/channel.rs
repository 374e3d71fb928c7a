//! Channel, block and timer identities.
//!
//! The controller has a fixed set of 16 channels.  For pulse generation
//! they are partitioned into 4 blocks of 4, and hardware timer *k* always
//! serves the channel at offset *k* inside whichever block is active.
//!
//! ```text
//!            offset 0   offset 1   offset 2   offset 3
//!            (timer 0)  (timer 1)  (timer 2)  (timer 3)
//! block 0  │   ch 0   │   ch 1   │   ch 2   │   ch 3   │
//! block 1  │   ch 4   │   ch 5   │   ch 6   │   ch 7   │
//! block 2  │   ch 8   │   ch 9   │   ch 10  │   ch 11  │
//! block 3  │   ch 12  │   ch 13  │   ch 14  │   ch 15  │
//! ```

use core::fmt;

/// Number of physical I/O channels.
pub const NUM_CHANNELS: usize = 16;
/// Number of hardware one-shot timers used for pulse generation.
pub const NUM_TIMERS: usize = 4;
/// Channels serviced together on one scheduling tick.
pub const CHANNELS_PER_BLOCK: usize = NUM_TIMERS;
/// Number of blocks in one full round-robin sweep.
pub const NUM_BLOCKS: usize = NUM_CHANNELS / CHANNELS_PER_BLOCK;

/// A validated channel index (0..16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(u8);

impl ChannelId {
    /// Returns `None` for indices outside 0..16.
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < NUM_CHANNELS {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    /// The block this channel belongs to.
    pub const fn block(self) -> BlockId {
        BlockId(self.0 / CHANNELS_PER_BLOCK as u8)
    }

    /// The timer that serves this channel when its block is active.
    pub const fn timer(self) -> TimerId {
        TimerId(self.0 % CHANNELS_PER_BLOCK as u8)
    }

    /// Iterate over every channel in ascending order.
    pub fn all() -> impl Iterator<Item = ChannelId> {
        (0..NUM_CHANNELS as u8).map(ChannelId)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// One of the 4 groups of channels serviced per scheduling tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(u8);

impl BlockId {
    pub const FIRST: BlockId = BlockId(0);
    pub const LAST: BlockId = BlockId(NUM_BLOCKS as u8 - 1);

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Following block, wrapping 3 → 0.
    pub const fn next(self) -> BlockId {
        BlockId((self.0 + 1) % NUM_BLOCKS as u8)
    }

    /// The channel at `timer`'s offset inside this block.
    pub const fn channel(self, timer: TimerId) -> ChannelId {
        ChannelId(self.0 * CHANNELS_PER_BLOCK as u8 + timer.0)
    }
}

/// How much of a pulse interval a timer can count natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerWidth {
    /// 16-bit counter: the whole interval fits, one expiry per pulse.
    Wide,
    /// 8-bit period register: longer intervals are chained in software.
    Narrow,
}

/// One of the 4 hardware one-shot timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u8);

impl TimerId {
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < NUM_TIMERS {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Timers at even offsets are 16-bit, odd offsets are 8-bit.
    pub const fn width(self) -> TimerWidth {
        if self.0 % 2 == 0 {
            TimerWidth::Wide
        } else {
            TimerWidth::Narrow
        }
    }

    pub fn all() -> impl Iterator<Item = TimerId> {
        (0..NUM_TIMERS as u8).map(TimerId)
    }
}
