use crc::{Crc, CRC_16_ARC};

use crate::codec::find_subslice;
use crate::error::{FrameError, Result};
use crate::profile::DeviceProfile;

/// Number of hex digits transmitted after the trailer marker.
pub const CHECKSUM_DIGITS: usize = 4;

// CRC-16/ARC: poly 0x8005 reflected, init 0, no final xor.
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// CRC-16 of `data` as transmitted by the meter.
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Render a checksum the way it appears on the wire: 4 uppercase hex digits.
pub fn render_checksum(value: u16) -> String {
    format!("{value:04X}")
}

/// Byte range covered by the checksum: header marker through trailer marker.
///
/// Returns `(start, end)` with `end` exclusive, i.e. the index of the first
/// checksum digit.
pub fn checksum_range(frame: &[u8], profile: &DeviceProfile) -> Result<(usize, usize)> {
    let header = profile.header_marker.as_bytes();
    let trailer = profile.trailer_marker.as_bytes();

    let start = find_subslice(frame, header).ok_or(FrameError::MissingHeader)?;
    let offset = find_subslice(&frame[start..], trailer).ok_or(FrameError::MissingTrailer)?;
    Ok((start, start + offset + trailer.len()))
}

/// Verify the checksum of a frame candidate.
///
/// Success requires exact string equality between the transmitted digits
/// and the computed value rendered by [`render_checksum`].
pub fn validate(frame: &[u8], profile: &DeviceProfile) -> Result<()> {
    let (start, end) = checksum_range(frame, profile)?;
    let transmitted = frame
        .get(end..end + CHECKSUM_DIGITS)
        .ok_or(FrameError::MissingTrailer)?;
    let computed = render_checksum(crc16(&frame[start..end]));

    if transmitted != computed.as_bytes() {
        return Err(FrameError::ChecksumMismatch {
            transmitted: String::from_utf8_lossy(transmitted).into_owned(),
            computed,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SAMPLE_FRAME;

    #[test]
    fn crc16_check_value() {
        assert_eq!(crc16(b"123456789"), 0xBB3D);
    }

    #[test]
    fn renders_zero_padded_uppercase() {
        assert_eq!(render_checksum(0x0a1f), "0A1F");
        assert_eq!(render_checksum(0), "0000");
    }

    #[test]
    fn sample_frame_is_valid() {
        validate(SAMPLE_FRAME, &DeviceProfile::default()).unwrap();
    }

    #[test]
    fn range_spans_header_through_trailer() {
        let (start, end) = checksum_range(SAMPLE_FRAME, &DeviceProfile::default()).unwrap();
        assert_eq!(start, 0);
        assert_eq!(SAMPLE_FRAME[end - 1], b'!');
        assert_eq!(&SAMPLE_FRAME[end..end + 4], b"853C");
    }

    #[test]
    fn any_single_byte_flip_is_detected() {
        let profile = DeviceProfile::default();
        let (start, end) = checksum_range(SAMPLE_FRAME, &profile).unwrap();

        for index in start..end {
            for mask in [0x01u8, 0x20, 0xFF] {
                let mut corrupted = SAMPLE_FRAME.to_vec();
                corrupted[index] ^= mask;
                let result = validate(&corrupted, &profile);
                assert!(
                    matches!(result, Err(ref err) if err.is_checksum()),
                    "flip at {index} with mask {mask:#04x} not detected"
                );
            }
        }
    }

    #[test]
    fn lowercase_digits_do_not_match() {
        let mut frame = SAMPLE_FRAME.to_vec();
        let (_, end) = checksum_range(&frame, &DeviceProfile::default()).unwrap();
        frame[end + 3] = b'c';
        let err = validate(&frame, &DeviceProfile::default()).unwrap_err();
        assert!(matches!(err, FrameError::ChecksumMismatch { .. }));
    }

    #[test]
    fn missing_trailer_is_reported() {
        let frame = &SAMPLE_FRAME[..600];
        let err = validate(frame, &DeviceProfile::default()).unwrap_err();
        assert!(matches!(err, FrameError::MissingTrailer));
    }

    #[test]
    fn truncated_checksum_is_reported() {
        let (_, end) = checksum_range(SAMPLE_FRAME, &DeviceProfile::default()).unwrap();
        let err = validate(&SAMPLE_FRAME[..end + 2], &DeviceProfile::default()).unwrap_err();
        assert!(matches!(err, FrameError::MissingTrailer));
    }
}
