//! Response composition for the command protocol.
//!
//! A response frame is `token/tag/payload` where the tag is one byte naming
//! the payload type. Payloads borrow from whatever the handler answered with
//! (a registry name, a config page) and are copied onto the wire at encode
//! time.

use core::fmt::Write as _;

use heapless::{String, Vec};

use crate::frame::{is_valid_token, FrameError, MAX_FRAME_LEN};

/// Wire error codes carried by `e/` responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    /// No registered node matches the requested name
    UnkNode,
    /// Handler failed or its response did not fit the frame budget
    UnkError,
    /// Config page requested with no config installed
    NoConf,
    /// Page or node index out of range (or not a number)
    InvIndex,
    /// Write attempt on a read-only property
    Access,
    /// Property name not recognized by the node
    UnkProp,
}

impl ErrorCode {
    /// Wire spelling of this error code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnkNode => "UNK_NODE",
            ErrorCode::UnkError => "UNK_ERROR",
            ErrorCode::NoConf => "NO_CONF",
            ErrorCode::InvIndex => "INV_INDEX",
            ErrorCode::Access => "ACCESS",
            ErrorCode::UnkProp => "UNK_PROP",
        }
    }
}

/// A composed reply, tagged with its wire type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response<'a> {
    /// `i/` decimal integer
    Integer(i32),
    /// `t/` raw text bytes
    Text(&'a [u8]),
    /// `h/` hexadecimal bitmask, uppercase, no `0x` prefix
    Hex(u32),
    /// `n/` bareword name
    Name(&'a str),
    /// `e/` error code
    Error(ErrorCode),
}

impl Response<'_> {
    /// One-byte wire tag for this response type
    pub fn type_tag(&self) -> u8 {
        match self {
            Response::Integer(_) => b'i',
            Response::Text(_) => b't',
            Response::Hex(_) => b'h',
            Response::Name(_) => b'n',
            Response::Error(_) => b'e',
        }
    }

    /// Encode the full reply frame `token/tag/payload`.
    ///
    /// Fails with [`FrameError::TooLong`] rather than transmitting a
    /// truncated payload; the dispatcher substitutes a generic error
    /// response in that case.
    pub fn encode(&self, token: u8) -> Result<Vec<u8, MAX_FRAME_LEN>, FrameError> {
        if !is_valid_token(token) {
            return Err(FrameError::InvalidToken);
        }

        let mut frame = Vec::new();
        frame.push(token).map_err(|_| FrameError::TooLong)?;
        frame.push(b'/').map_err(|_| FrameError::TooLong)?;
        frame.push(self.type_tag()).map_err(|_| FrameError::TooLong)?;
        frame.push(b'/').map_err(|_| FrameError::TooLong)?;

        match self {
            Response::Integer(value) => {
                // i32 is at most 11 characters, the buffer cannot overflow
                let mut digits: String<12> = String::new();
                let _ = write!(digits, "{}", value);
                frame
                    .extend_from_slice(digits.as_bytes())
                    .map_err(|_| FrameError::TooLong)?;
            }
            Response::Text(bytes) => {
                frame
                    .extend_from_slice(bytes)
                    .map_err(|_| FrameError::TooLong)?;
            }
            Response::Hex(bits) => {
                // u32 is at most 8 hex digits, the buffer cannot overflow
                let mut digits: String<8> = String::new();
                let _ = write!(digits, "{:X}", bits);
                frame
                    .extend_from_slice(digits.as_bytes())
                    .map_err(|_| FrameError::TooLong)?;
            }
            Response::Name(name) => {
                frame
                    .extend_from_slice(name.as_bytes())
                    .map_err(|_| FrameError::TooLong)?;
            }
            Response::Error(code) => {
                frame
                    .extend_from_slice(code.as_str().as_bytes())
                    .map_err(|_| FrameError::TooLong)?;
            }
        }

        Ok(frame)
    }
}
