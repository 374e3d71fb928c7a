//! Application core: channel logic, zero I/O.
//!
//! [`service::ChannelService`] runs the debounce, motion and output
//! engines on their cadences and routes inbound actions.  All
//! interaction with pins, timers, the network and storage happens
//! through the **port traits** in [`ports`].

pub mod ports;
pub mod service;
