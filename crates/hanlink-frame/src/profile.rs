use std::path::Path;

use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::checksum::CHECKSUM_DIGITS;
use crate::error::ProfileError;
use crate::tag::TagTable;

/// Identifier line of the default profile (Aidon 6534, Swedish HAN port).
pub const DEFAULT_IDENTIFIER: &str = "/ADN9 6534";

/// Total frame length of the default profile, CRLF after the checksum included.
pub const DEFAULT_FRAME_LENGTH: usize = 705;

/// Everything the pipeline needs to know about one meter's frame format.
///
/// Shipping another meter is a matter of writing one of these (for example
/// as JSON, see [`DeviceProfile::from_json_file`]); assembler, validator and
/// decoder are driven entirely by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceProfile {
    /// Header window that must match exactly, starting at the header marker.
    pub identifier: String,
    /// Literal that starts every frame.
    pub header_marker: String,
    /// Literal that ends the checksummed range.
    pub trailer_marker: String,
    /// Character opening a value window after its tag.
    pub value_delimiter: char,
    /// Exact frame length in bytes.
    pub frame_length: usize,
    /// UTC offset applied to timestamps flagged `W`.
    pub winter_utc_offset_minutes: i16,
    /// UTC offset applied to timestamps flagged `S`.
    pub summer_utc_offset_minutes: i16,
    pub tags: TagTable,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            identifier: DEFAULT_IDENTIFIER.to_string(),
            header_marker: "/".to_string(),
            trailer_marker: "!".to_string(),
            value_delimiter: '(',
            frame_length: DEFAULT_FRAME_LENGTH,
            winter_utc_offset_minutes: 60,
            summer_utc_offset_minutes: 120,
            tags: TagTable::default(),
        }
    }
}

impl DeviceProfile {
    /// Parse and validate a profile from JSON. Omitted keys take default values.
    pub fn from_json_str(json: &str) -> Result<Self, ProfileError> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load and validate a profile from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reject profiles the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.header_marker.is_empty() || self.trailer_marker.is_empty() {
            return Err(ProfileError::Invalid(
                "header and trailer markers must not be empty".to_string(),
            ));
        }
        if !self.identifier.starts_with(&self.header_marker) {
            return Err(ProfileError::Invalid(format!(
                "identifier '{}' must start with header marker '{}'",
                self.identifier, self.header_marker
            )));
        }
        if !self.value_delimiter.is_ascii() {
            return Err(ProfileError::Invalid(
                "value delimiter must be an ASCII character".to_string(),
            ));
        }
        let minimum = self.identifier.len() + self.trailer_marker.len() + CHECKSUM_DIGITS;
        if self.frame_length < minimum {
            return Err(ProfileError::Invalid(format!(
                "frame length {} is shorter than identifier, trailer and checksum ({minimum})",
                self.frame_length
            )));
        }
        self.winter_offset()?;
        self.summer_offset()?;
        self.tags.validate()
    }

    pub fn winter_offset(&self) -> Result<UtcOffset, ProfileError> {
        offset_from_minutes(self.winter_utc_offset_minutes)
    }

    pub fn summer_offset(&self) -> Result<UtcOffset, ProfileError> {
        offset_from_minutes(self.summer_utc_offset_minutes)
    }
}

fn offset_from_minutes(minutes: i16) -> Result<UtcOffset, ProfileError> {
    UtcOffset::from_whole_seconds(i32::from(minutes) * 60)
        .map_err(|err| ProfileError::Invalid(format!("invalid utc offset {minutes} min: {err}")))
}
