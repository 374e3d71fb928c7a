//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                 |
//! |----------------|--------------------|-----------------------------|
//! | `gpio`         | PinPort            | `embedded-hal` digital pins |
//! | `log_bus`      | EventBus           | Serial log output           |
//! | `memory_store` | ConfigPort         | In-memory key-value store   |
//! |                | StoragePort        |                             |
//!
//! [`PulseHardware`](crate::app::ports::PulseHardware) is implemented by
//! the board support layer, which owns the timer registers.

pub mod gpio;
pub mod log_bus;
pub mod memory_store;
