//! Command Protocol for the Cairn Altimeter
//!
//! This crate defines the request/response protocol between the altimeter and
//! a remote client on the other end of the BLE serial link. The protocol is
//! designed for tiny frames, human-readable debugging, and a transport that
//! delivers one frame at a time.
//!
//! # Protocol Overview
//!
//! Requests are ASCII, `/`-delimited, at most 20 bytes on the wire:
//! ```text
//! ┌───────┬───┬──────┬───┬──────────┬───┬────────────┐
//! │ TOKEN │ / │ NODE │ / │ PROPERTY │ / │ VALUE      │
//! │ 1B    │   │      │   │          │   │ (optional) │
//! └───────┴───┴──────┴───┴──────────┴───┴────────────┘
//! ```
//!
//! The token is a single printable byte chosen by the client to correlate the
//! response; a missing VALUE field makes the request a read, a present one a
//! write. Responses carry the token back followed by a one-byte type tag:
//! ```text
//! ┌───────┬───┬─────┬───┬─────────┐
//! │ TOKEN │ / │ TAG │ / │ PAYLOAD │
//! └───────┴───┴─────┴───┴─────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod frame;
pub mod response;

pub use frame::{is_valid_token, FrameError, Request, MAX_FRAME_LEN};
pub use response::{ErrorCode, Response};
