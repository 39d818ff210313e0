//! Request frame parsing and composition.
//!
//! A request frame is `token/node/property[/value]`, ASCII, bounded by the
//! transport's frame limit. Decoding borrows the receive buffer instead of
//! copying; the buffer must stay alive until the response has been composed.

use heapless::Vec;

/// Maximum bytes in one wire frame, request or response.
///
/// The BLE serial transport delivers at most 20 usable bytes per frame
/// (its buffers are 21 bytes with a trailing NUL).
pub const MAX_FRAME_LEN: usize = 20;

/// Check whether a byte is a valid correlation token.
///
/// Tokens are single printable bytes in `[0x30, 0x7E]` (`'0'..='~'`), which
/// excludes the `/` field separator.
pub fn is_valid_token(byte: u8) -> bool {
    (0x30..=0x7E).contains(&byte)
}

/// Errors that can occur while decoding or composing a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Frame does not match the `token/node/property[/value]` shape
    Malformed,
    /// Token is missing, longer than one byte, or outside the printable range
    InvalidToken,
    /// Frame would exceed [`MAX_FRAME_LEN`]
    TooLong,
}

/// A decoded request, borrowing the receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Request<'a> {
    /// Client-chosen correlation token, echoed in the response
    pub token: u8,
    /// Name of the addressed node
    pub node: &'a str,
    /// Property of the node being accessed
    pub property: &'a str,
    /// Write value; `None` makes this a read request
    pub value: Option<&'a str>,
}

impl<'a> Request<'a> {
    /// Decode one request frame.
    ///
    /// The transport may pad a frame with trailing NUL bytes; padding is
    /// ignored. Fields past the fourth are ignored, and an empty value field
    /// (a trailing `/`) is treated as a read, matching the reference
    /// tokenizer on the wire peer.
    pub fn decode(frame: &'a [u8]) -> Result<Self, FrameError> {
        let end = frame.iter().position(|&b| b == 0).unwrap_or(frame.len());
        let frame = &frame[..end];
        if frame.len() > MAX_FRAME_LEN {
            return Err(FrameError::TooLong);
        }

        let text = core::str::from_utf8(frame).map_err(|_| FrameError::Malformed)?;
        let mut fields = text.split('/');

        let token = match fields.next().unwrap_or("").as_bytes() {
            &[byte] if is_valid_token(byte) => byte,
            _ => return Err(FrameError::InvalidToken),
        };
        let node = fields
            .next()
            .filter(|f| !f.is_empty())
            .ok_or(FrameError::Malformed)?;
        let property = fields
            .next()
            .filter(|f| !f.is_empty())
            .ok_or(FrameError::Malformed)?;
        let value = fields.next().filter(|f| !f.is_empty());

        Ok(Self {
            token,
            node,
            property,
            value,
        })
    }

    /// Compose this request into a wire frame (client side)
    pub fn encode(&self) -> Result<Vec<u8, MAX_FRAME_LEN>, FrameError> {
        if !is_valid_token(self.token) {
            return Err(FrameError::InvalidToken);
        }
        if self.node.is_empty() || self.property.is_empty() {
            return Err(FrameError::Malformed);
        }

        let mut frame = Vec::new();
        frame.push(self.token).map_err(|_| FrameError::TooLong)?;
        frame.push(b'/').map_err(|_| FrameError::TooLong)?;
        frame
            .extend_from_slice(self.node.as_bytes())
            .map_err(|_| FrameError::TooLong)?;
        frame.push(b'/').map_err(|_| FrameError::TooLong)?;
        frame
            .extend_from_slice(self.property.as_bytes())
            .map_err(|_| FrameError::TooLong)?;
        if let Some(value) = self.value {
            frame.push(b'/').map_err(|_| FrameError::TooLong)?;
            frame
                .extend_from_slice(value.as_bytes())
                .map_err(|_| FrameError::TooLong)?;
        }
        Ok(frame)
    }

    /// Returns true if this is a read request
    pub fn is_read(&self) -> bool {
        self.value.is_none()
    }

    /// Returns true if this is a write request
    pub fn is_write(&self) -> bool {
        self.value.is_some()
    }
}
