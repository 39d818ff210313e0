//! Byte link abstraction for the wireless serial transport
//!
//! The BLE bridge delivers and accepts one frame at a time; there is no
//! stream framing to recover at this layer.

/// Frame-oriented byte transport
pub trait Link {
    /// Error type for transport operations
    type Error;

    /// Non-blocking read of one inbound frame.
    ///
    /// Returns the number of bytes placed in `buf`; `Ok(0)` means no frame
    /// is pending and is not an error.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write one outbound frame
    fn write(&mut self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Block until inbound data may be available or the timeout elapses
    fn wait(&mut self, timeout_ms: u32) -> Result<(), Self::Error>;
}
