//! Sentinel-based identifier frame extraction.
//!
//! Card readers stream free-form bytes over the serial link: boot banners,
//! debug output, and eventually a frame carrying the card identifier. The
//! [`FrameExtractor`] accumulates those bytes and pulls out the first
//! well-formed frame.
//!
//! # Frame Formats
//!
//! Text frames (card reader):
//!
//! ```text
//! ... junk ...  ID:  A1B2C3D4  \r\n
//!               ^^^  ^^^^^^^^  ^^^^
//!          sentinel  token     terminator
//! ```
//!
//! The token is everything after the sentinel with leading whitespace
//! skipped, up to the first `\n` or `\r`, trimmed. Tokens shorter than the
//! minimum identifier length are discarded and the search continues after
//! them. A token is only accepted once its terminator has arrived.
//!
//! Binary frames (dispenser controller):
//!
//! ```text
//! PID: <b0> <b1> <b2> <b3>   ──>   "B0B1B2B3" (uppercase hex)
//! ```
//!
//! # Example
//!
//! ```
//! use medispense_rfid::{FrameExtractor, FrameFormat};
//!
//! let mut extractor = FrameExtractor::new(FrameFormat::text());
//!
//! assert!(extractor.feed(b"junkID: a1b2").is_none());
//! let id = extractor.feed(b"c3d4\r\n").unwrap();
//! assert_eq!(id.as_str(), "A1B2C3D4");
//! ```

use bytes::{Buf, BytesMut};
use medispense_core::CardId;
use medispense_core::constants::{ID_SENTINEL, PID_SENTINEL, PID_UID_BYTES};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Maximum bytes buffered after a sentinel while waiting for a terminator.
///
/// A reader that emits a sentinel and then streams without a line break is
/// malfunctioning; the dangling sentinel is dropped past this size.
const MAX_BUFFER_SIZE: usize = 4 * 1024; // 4 KB

/// Initial buffer capacity. Frames are short.
const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Wire format of an identifier frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameFormat {
    /// `<sentinel><token><\n|\r>`, token decoded as UTF-8 text.
    Text {
        /// Marker preceding the token.
        sentinel: String,
    },

    /// `<sentinel><uid bytes>`, rendered as uppercase hex.
    Binary {
        /// Marker preceding the UID bytes.
        sentinel: String,

        /// Number of raw UID bytes following the sentinel.
        uid_len: usize,
    },
}

impl FrameFormat {
    /// Card reader text frame: `ID:<token>\n`.
    pub fn text() -> Self {
        Self::Text {
            sentinel: ID_SENTINEL.to_string(),
        }
    }

    /// Dispenser controller binary frame: `PID:` + 4 UID bytes.
    pub fn binary() -> Self {
        Self::Binary {
            sentinel: PID_SENTINEL.to_string(),
            uid_len: PID_UID_BYTES,
        }
    }

    /// Sentinel bytes for this format.
    pub fn sentinel(&self) -> &[u8] {
        match self {
            Self::Text { sentinel } | Self::Binary { sentinel, .. } => sentinel.as_bytes(),
        }
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self::text()
    }
}

/// Outcome of examining one sentinel occurrence.
enum Scan {
    /// Frame extracted; consume this many bytes.
    Frame(CardId, usize),
    /// Occurrence is unusable; consume this many bytes and keep searching.
    Skip(usize),
    /// Occurrence is incomplete; wait for more bytes.
    Incomplete,
}

/// Accumulating identifier frame extractor.
///
/// Bytes before a sentinel are discarded as they arrive, so the buffer only
/// ever holds a possibly-split sentinel or one pending frame.
#[derive(Debug)]
pub struct FrameExtractor {
    format: FrameFormat,
    buffer: BytesMut,
}

impl FrameExtractor {
    /// Create an extractor for the given format.
    pub fn new(format: FrameFormat) -> Self {
        Self {
            format,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Append bytes and try to extract a frame.
    ///
    /// Returns the first complete identifier, if any. Bytes following the
    /// frame stay buffered.
    pub fn feed(&mut self, bytes: &[u8]) -> Option<CardId> {
        self.buffer.extend_from_slice(bytes);
        self.extract()
    }

    /// Try to extract a frame from already buffered bytes.
    pub fn extract(&mut self) -> Option<CardId> {
        loop {
            let sentinel = self.format.sentinel();
            let payload_start = sentinel.len();
            let Some(pos) = find(&self.buffer, sentinel) else {
                self.discard_keeping_tail(payload_start.saturating_sub(1));
                return None;
            };

            // Nothing before the sentinel can ever be part of a frame.
            self.buffer.advance(pos);

            let scan = match &self.format {
                FrameFormat::Text { .. } => scan_text(&self.buffer[payload_start..]),
                FrameFormat::Binary { uid_len, .. } => {
                    scan_binary(&self.buffer[payload_start..], *uid_len)
                }
            };

            match scan {
                Scan::Frame(id, consumed) => {
                    self.buffer.advance(payload_start + consumed);
                    debug!(identifier = %id, "Frame extracted");
                    return Some(id);
                }
                Scan::Skip(consumed) => {
                    self.buffer.advance(payload_start + consumed);
                }
                Scan::Incomplete if self.buffer.len() > MAX_BUFFER_SIZE => {
                    debug!(
                        buffered = self.buffer.len(),
                        "Dropping unterminated frame"
                    );
                    self.buffer.advance(payload_start);
                }
                Scan::Incomplete => return None,
            }
        }
    }

    /// Number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Frame format handled by this extractor.
    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    /// Discard all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn discard_keeping_tail(&mut self, keep: usize) {
        if self.buffer.len() > keep {
            let drop = self.buffer.len() - keep;
            self.buffer.advance(drop);
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn scan_text(payload: &[u8]) -> Scan {
    let Some(start) = payload.iter().position(|b| !b.is_ascii_whitespace()) else {
        return Scan::Incomplete;
    };

    let token_region = &payload[start..];
    let Some(end) = token_region.iter().position(|&b| b == b'\n' || b == b'\r') else {
        return Scan::Incomplete;
    };
    let consumed = start + end + 1;

    let Ok(token) = std::str::from_utf8(&token_region[..end]) else {
        trace!("Skipping frame with invalid UTF-8 token");
        return Scan::Skip(consumed);
    };

    match CardId::new(token) {
        Ok(id) => Scan::Frame(id, consumed),
        Err(_) => {
            trace!(token = token.trim(), "Skipping short token");
            Scan::Skip(consumed)
        }
    }
}

fn scan_binary(payload: &[u8], uid_len: usize) -> Scan {
    if payload.len() < uid_len {
        return Scan::Incomplete;
    }

    match CardId::from_uid_bytes(&payload[..uid_len]) {
        Ok(id) => Scan::Frame(id, uid_len),
        Err(_) => Scan::Skip(uid_len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn text() -> FrameExtractor {
        FrameExtractor::new(FrameFormat::text())
    }

    #[rstest]
    #[case(b"junkID: A1B2C3D4\r\n", "A1B2C3D4")]
    #[case(b"ID:a1b2c3d4\n", "A1B2C3D4")]
    #[case(b"ID:\r\n  acc0176d  \n", "ACC0176D")]
    #[case(b"boot ok\nID: 0123456789ABCDEF\r", "0123456789ABCDEF")]
    #[case(b"ID: 123\nID: DEADBEEF\n", "DEADBEEF")]
    fn test_text_frames(#[case] input: &[u8], #[case] expected: &str) {
        let id = text().feed(input).unwrap();
        assert_eq!(id.as_str(), expected);
    }

    #[rstest]
    #[case(b"ID: 123\n")]
    #[case(b"ID: A1B2C3D4")]
    #[case(b"A1B2C3D4\r\n")]
    #[case(b"ID:    ")]
    #[case(b"")]
    fn test_text_no_frame(#[case] input: &[u8]) {
        assert!(text().feed(input).is_none());
    }

    #[test]
    fn test_short_token_does_not_block_later_frames() {
        let mut extractor = text();
        assert!(extractor.feed(b"ID: 123\n").is_none());
        assert_eq!(extractor.feed(b"ID: CAFEBABE\n").unwrap().as_str(), "CAFEBABE");
    }

    #[test]
    fn test_split_sentinel_across_chunks() {
        let mut extractor = text();
        assert!(extractor.feed(b"noise I").is_none());
        assert!(extractor.feed(b"D").is_none());
        assert!(extractor.feed(b": 12345678").is_none());
        assert_eq!(extractor.feed(b"\n").unwrap().as_str(), "12345678");
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut extractor = text();
        let mut result = None;
        for byte in b"xxID: feedface\r\n" {
            if let Some(id) = extractor.feed(&[*byte]) {
                result = Some(id);
            }
        }
        assert_eq!(result.unwrap().as_str(), "FEEDFACE");
    }

    #[test]
    fn test_junk_is_discarded() {
        let mut extractor = text();
        extractor.feed(&[b'x'; 1000]);
        assert!(extractor.buffered() < ID_SENTINEL.len());
    }

    #[test]
    fn test_unterminated_frame_is_bounded() {
        let mut extractor = text();
        extractor.feed(b"ID: ");
        extractor.feed(&vec![b'A'; MAX_BUFFER_SIZE + 10]);
        assert!(extractor.buffered() <= MAX_BUFFER_SIZE);
    }

    #[test]
    fn test_invalid_utf8_token_skipped() {
        let mut extractor = text();
        assert!(extractor.feed(b"ID: \xFF\xFE12345678\n").is_none());
        assert_eq!(extractor.feed(b"ID: 87654321\n").unwrap().as_str(), "87654321");
    }

    #[test]
    fn test_trailing_bytes_stay_buffered() {
        let mut extractor = text();
        let first = extractor.feed(b"ID: 11111111\nID: 22222222\n").unwrap();
        assert_eq!(first.as_str(), "11111111");
        assert_eq!(extractor.extract().unwrap().as_str(), "22222222");
    }

    #[test]
    fn test_binary_frame() {
        let mut extractor = FrameExtractor::new(FrameFormat::binary());
        assert!(extractor.feed(b"\x00\x01PID:\xE2\xFA").is_none());
        let id = extractor.feed(b"\x42\x06").unwrap();
        assert_eq!(id.as_str(), "E2FA4206");
    }

    #[test]
    fn test_binary_frame_not_fooled_by_text_sentinel() {
        let mut extractor = FrameExtractor::new(FrameFormat::binary());
        assert!(extractor.feed(b"ID: A1B2C3D4\n").is_none());
    }

    #[test]
    fn test_frame_format_serde() {
        let json = serde_json::to_string(&FrameFormat::binary()).unwrap();
        assert_eq!(json, r#"{"kind":"binary","sentinel":"PID:","uid_len":4}"#);

        let format: FrameFormat =
            serde_json::from_str(r#"{"kind":"text","sentinel":"ID:"}"#).unwrap();
        assert_eq!(format, FrameFormat::text());
    }
}
