use std::collections::BTreeMap;

use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use tracing::trace;

use crate::codec::find_subslice;
use crate::error::{FrameError, Result};
use crate::profile::DeviceProfile;
use crate::reading::Reading;
use crate::tag::{DecodeKind, Field, TagSpec};

const TIMESTAMP_DIGITS: usize = 12;

/// Decode a validated frame into a [`Reading`].
///
/// Either every field in the tag table decodes or the whole frame fails;
/// no partial reading is ever produced.
pub fn decode(frame: &[u8], profile: &DeviceProfile) -> Result<Reading> {
    let mut timestamp = None;
    let mut values = BTreeMap::new();

    for spec in profile.tags.entries() {
        let window = value_window(frame, spec, profile.value_delimiter)?;
        match spec.kind {
            DecodeKind::Timestamp => {
                timestamp = Some(parse_timestamp(window, profile)?);
            }
            DecodeKind::Decimal => {
                let value = parse_decimal(&spec.tag, window)?;
                trace!(field = spec.field.name(), value, "decoded field");
                values.insert(spec.field, value);
            }
        }
    }

    let timestamp = timestamp.ok_or(FrameError::MissingField(Field::Timestamp))?;
    Reading::from_values(timestamp, &values)
}

/// The fixed-width window right after `tag` and its opening delimiter.
fn value_window<'a>(frame: &'a [u8], spec: &TagSpec, delimiter: char) -> Result<&'a [u8]> {
    let mut needle = Vec::with_capacity(spec.tag.len() + 1);
    needle.extend_from_slice(spec.tag.as_bytes());
    needle.push(delimiter as u8);

    let position = find_subslice(frame, &needle).ok_or_else(|| FrameError::MissingTag {
        tag: spec.tag.clone(),
    })?;
    let start = position + needle.len();
    frame
        .get(start..start + spec.width)
        .ok_or_else(|| FrameError::TruncatedValue {
            tag: spec.tag.clone(),
        })
}

/// Digits with at most one decimal point; no signs, exponents or spaces.
fn parse_decimal(tag: &str, window: &[u8]) -> Result<f64> {
    let invalid = || FrameError::InvalidNumber {
        tag: tag.to_string(),
        window: String::from_utf8_lossy(window).into_owned(),
    };

    let digits = window.iter().filter(|b| b.is_ascii_digit()).count();
    let points = window.iter().filter(|b| **b == b'.').count();
    if digits == 0 || points > 1 || digits + points != window.len() {
        return Err(invalid());
    }

    let text = std::str::from_utf8(window).map_err(|_| invalid())?;
    text.parse::<f64>().map_err(|_| invalid())
}

fn parse_timestamp(window: &[u8], profile: &DeviceProfile) -> Result<OffsetDateTime> {
    let invalid = |reason: String| FrameError::InvalidTimestamp {
        window: String::from_utf8_lossy(window).into_owned(),
        reason,
    };

    if window.len() <= TIMESTAMP_DIGITS {
        return Err(invalid("missing daylight-saving flag".to_string()));
    }
    let (digits, flag) = window.split_at(TIMESTAMP_DIGITS);
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid("expected 12 digits YYMMDDhhmmss".to_string()));
    }

    let pair = |index: usize| (digits[index] - b'0') * 10 + (digits[index + 1] - b'0');
    let year = 2000 + i32::from(pair(0));
    let month = Month::try_from(pair(2)).map_err(|err| invalid(err.to_string()))?;
    let date =
        Date::from_calendar_date(year, month, pair(4)).map_err(|err| invalid(err.to_string()))?;
    let time =
        Time::from_hms(pair(6), pair(8), pair(10)).map_err(|err| invalid(err.to_string()))?;

    let offset: UtcOffset = match flag[0] {
        b'W' => profile.winter_offset(),
        b'S' => profile.summer_offset(),
        other => {
            return Err(invalid(format!(
                "unknown daylight-saving flag '{}'",
                char::from(other)
            )))
        }
    }
    .map_err(|err| invalid(err.to_string()))?;

    Ok(PrimitiveDateTime::new(date, time)
        .assume_offset(offset)
        .to_offset(UtcOffset::UTC))
}
