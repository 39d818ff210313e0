//! Board-agnostic core logic for the Cairn altimeter firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Node registry and request dispatch (the command server)
//! - Built-in SYS introspection node
//! - Config blob paging
//! - AGL altitude tracking and display formatting
//! - Collaborator traits (byte link, monotonic clock)
//!
//! The firmware crate wires a concrete BLE serial link and timer into
//! [`server::CommandServer`] and drives it by calling
//! [`server::CommandServer::poll_once`] from its main loop.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod altitude;
pub mod config;
pub mod registry;
pub mod server;
pub mod traits;

mod sys;

pub use registry::{
    HandlerError, Node, Registry, RegistryError, RequestHandler, MAX_NODE_COUNT,
};
pub use server::{CommandServer, PollOutcome};
pub use traits::{Clock, Link};
