//! Tokio codec for the dispenser controller's line protocol.
//!
//! The controller speaks newline-terminated ASCII in both directions:
//!
//! ```text
//! host ──> MED:A1B0C0D0E2\n ──> controller
//! host <── DONE\n           <── controller
//! host ──> END\n            ──> controller
//! host <── STK:00010\n      <── controller
//! ```
//!
//! [`DispenserCodec`] implements [`Decoder`] for incoming [`DeviceLine`]s and
//! [`Encoder`] for outgoing [`HostCommand`]s. It works with `Framed` on any
//! async byte stream, or can be fed directly from a bounded-read transport.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use tokio_util::codec::Decoder;
//! use medispense_protocol::{DeviceLine, DispenserCodec};
//!
//! let mut codec = DispenserCodec::new();
//! let mut buffer = BytesMut::from(&b"booting\r\nDO"[..]);
//!
//! assert!(matches!(codec.decode(&mut buffer), Ok(Some(DeviceLine::Unrecognized(_)))));
//! assert!(matches!(codec.decode(&mut buffer), Ok(None)));
//!
//! buffer.extend_from_slice(b"NE\n");
//! assert_eq!(codec.decode(&mut buffer).unwrap(), Some(DeviceLine::Done));
//! ```

use bytes::{Buf, BytesMut};
use medispense_core::{Error, Result};
use tokio_util::codec::{Decoder, Encoder};

use crate::command::HostCommand;
use crate::response::DeviceLine;

/// Default maximum line length in bytes.
///
/// Controller lines are a few dozen bytes; anything longer is a stuck or
/// misconfigured device.
const DEFAULT_MAX_LINE_LENGTH: usize = 1024;

/// Line codec for the dispenser controller.
#[derive(Debug)]
pub struct DispenserCodec {
    max_line_length: usize,
}

impl DispenserCodec {
    /// Create a codec with the default line length limit.
    pub fn new() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Create a codec with a custom line length limit.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self { max_line_length }
    }

    /// Maximum accepted line length.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }
}

impl Default for DispenserCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for DispenserCodec {
    type Item = DeviceLine;
    type Error = Error;

    /// Decode the next non-blank line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LineTooLong`] when no terminator arrives within the
    /// length limit. The oversized bytes are discarded so decoding can
    /// continue with the next line.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<DeviceLine>> {
        loop {
            let Some(end) = src.iter().position(|&b| b == b'\n') else {
                if src.len() > self.max_line_length {
                    let size = src.len();
                    src.clear();
                    return Err(Error::LineTooLong {
                        size,
                        max_size: self.max_line_length,
                    });
                }
                return Ok(None);
            };

            let line = src.split_to(end + 1);
            if end > self.max_line_length {
                return Err(Error::LineTooLong {
                    size: end,
                    max_size: self.max_line_length,
                });
            }

            let text = String::from_utf8_lossy(&line[..end]);
            if text.trim().is_empty() {
                continue;
            }
            return Ok(Some(DeviceLine::parse(&text)));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<DeviceLine>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        // Trailing bytes without a terminator still count as a line.
        let text = String::from_utf8_lossy(&src[..]).into_owned();
        src.advance(src.len());
        Ok((!text.trim().is_empty()).then(|| DeviceLine::parse(&text)))
    }
}

impl Encoder<HostCommand> for DispenserCodec {
    type Error = Error;

    fn encode(&mut self, item: HostCommand, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(&item.to_wire());
        Ok(())
    }
}
