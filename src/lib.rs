//! Channel-behavior engine for a 16-pin configurable I/O controller.
//!
//! Every pin is independently an input, a digital output, or a
//! position-controlled actuator (servo, bounce, multi-position).  Inputs
//! are debounced into producer events; actuators are moved by inbound
//! consumer actions and driven by 4 hardware one-shot timers shared
//! across all 16 channels.
//!
//! Hardware, the network and storage are reached only through the port
//! traits in [`app::ports`], so the whole engine runs on the host against
//! the adapters in [`adapters`] and the mocks in the test suite.

#![deny(unused_must_use)]

pub mod action;
pub mod adapters;
pub mod app;
pub mod channel;
pub mod config;
pub mod dispatch;
pub mod inputs;
pub mod motion;
pub mod outputs;
pub mod persist;
pub mod scheduler;
pub mod ticks;

mod error;

pub use error::{ConfigError, Error, Result, StorageError};
