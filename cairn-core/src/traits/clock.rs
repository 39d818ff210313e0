//! Monotonic time source

/// Millisecond time source used for request latency diagnostics
pub trait Clock {
    /// Milliseconds since an arbitrary epoch; wraps at `u32::MAX`
    fn now_ms(&self) -> u32;
}
