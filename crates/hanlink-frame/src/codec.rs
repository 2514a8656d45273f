use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::{crc16, render_checksum};
use crate::error::{FrameError, Result};
use crate::profile::DeviceProfile;

/// Line terminator written after the checksum.
pub const LINE_END: &[u8] = b"\r\n";

/// One complete frame candidate, exactly `frame_length` bytes long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    /// Wrap raw frame bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Find the start of a complete frame in `src`.
///
/// Every occurrence of the header marker is tried in order; the first one
/// whose identifier window matches the profile and that has at least
/// `frame_length` bytes behind it wins. Returns `None` if the buffer does
/// not (yet) hold such a frame.
pub fn locate_frame(src: &[u8], profile: &DeviceProfile) -> Option<usize> {
    let marker = profile.header_marker.as_bytes();
    let identifier = profile.identifier.as_bytes();

    let mut from = 0;
    while let Some(offset) = find_subslice(&src[from..], marker) {
        let start = from + offset;
        let candidate = &src[start..];
        if candidate.starts_with(identifier) && candidate.len() >= profile.frame_length {
            return Some(start);
        }
        from = start + 1;
    }
    None
}

/// Encode a frame body into wire format.
///
/// `body` runs from the header marker up to (not including) the trailer
/// marker. The trailer, the checksum and a CRLF are appended.
///
/// Wire format:
/// ```text
/// /ADN9 6534\r\n            <- header marker + identifier
/// \r\n
/// 0-0:1.0.0(201017093015S)\r\n
/// 1-0:1.8.0(00005996.149*kWh)\r\n
/// ...
/// !853C\r\n                 <- trailer marker + CRC-16 of "/" ..= "!"
/// ```
pub fn encode_frame(body: &[u8], profile: &DeviceProfile, dst: &mut BytesMut) -> Result<()> {
    let start = find_subslice(body, profile.header_marker.as_bytes())
        .ok_or(FrameError::MissingHeader)?;
    let trailer = profile.trailer_marker.as_bytes();

    let mut covered = Vec::with_capacity(body.len() - start + trailer.len());
    covered.extend_from_slice(&body[start..]);
    covered.extend_from_slice(trailer);
    let checksum = render_checksum(crc16(&covered));

    dst.reserve(body.len() + trailer.len() + checksum.len() + LINE_END.len());
    dst.put_slice(body);
    dst.put_slice(trailer);
    dst.put_slice(checksum.as_bytes());
    dst.put_slice(LINE_END);
    Ok(())
}
