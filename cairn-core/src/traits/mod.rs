//! Collaborator traits implemented by the hardware layer
//!
//! The command server is written against these seams so the same logic runs
//! on the target board and under host tests.

pub mod clock;
pub mod link;

pub use clock::Clock;
pub use link::Link;
