//! Declarative frame layout: which tag carries which reading field.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// A named value carried by every [`Reading`](crate::Reading).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Timestamp,
    ActiveImportTotal,
    ActiveExportTotal,
    ReactiveImportTotal,
    ReactiveExportTotal,
    ActiveImport,
    ActiveExport,
    ReactiveImport,
    ReactiveExport,
    ActiveImportL1,
    ActiveImportL2,
    ActiveImportL3,
    ActiveExportL1,
    ActiveExportL2,
    ActiveExportL3,
    ReactiveImportL1,
    ReactiveImportL2,
    ReactiveImportL3,
    ReactiveExportL1,
    ReactiveExportL2,
    ReactiveExportL3,
    VoltageL1,
    VoltageL2,
    VoltageL3,
    CurrentL1,
    CurrentL2,
    CurrentL3,
}

impl Field {
    /// Every field, in reading order.
    pub const ALL: [Field; 27] = [
        Field::Timestamp,
        Field::ActiveImportTotal,
        Field::ActiveExportTotal,
        Field::ReactiveImportTotal,
        Field::ReactiveExportTotal,
        Field::ActiveImport,
        Field::ActiveExport,
        Field::ReactiveImport,
        Field::ReactiveExport,
        Field::ActiveImportL1,
        Field::ActiveImportL2,
        Field::ActiveImportL3,
        Field::ActiveExportL1,
        Field::ActiveExportL2,
        Field::ActiveExportL3,
        Field::ReactiveImportL1,
        Field::ReactiveImportL2,
        Field::ReactiveImportL3,
        Field::ReactiveExportL1,
        Field::ReactiveExportL2,
        Field::ReactiveExportL3,
        Field::VoltageL1,
        Field::VoltageL2,
        Field::VoltageL3,
        Field::CurrentL1,
        Field::CurrentL2,
        Field::CurrentL3,
    ];

    /// Snake-case name, as used in serialized readings.
    pub fn name(self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::ActiveImportTotal => "active_import_total",
            Field::ActiveExportTotal => "active_export_total",
            Field::ReactiveImportTotal => "reactive_import_total",
            Field::ReactiveExportTotal => "reactive_export_total",
            Field::ActiveImport => "active_import",
            Field::ActiveExport => "active_export",
            Field::ReactiveImport => "reactive_import",
            Field::ReactiveExport => "reactive_export",
            Field::ActiveImportL1 => "active_import_l1",
            Field::ActiveImportL2 => "active_import_l2",
            Field::ActiveImportL3 => "active_import_l3",
            Field::ActiveExportL1 => "active_export_l1",
            Field::ActiveExportL2 => "active_export_l2",
            Field::ActiveExportL3 => "active_export_l3",
            Field::ReactiveImportL1 => "reactive_import_l1",
            Field::ReactiveImportL2 => "reactive_import_l2",
            Field::ReactiveImportL3 => "reactive_import_l3",
            Field::ReactiveExportL1 => "reactive_export_l1",
            Field::ReactiveExportL2 => "reactive_export_l2",
            Field::ReactiveExportL3 => "reactive_export_l3",
            Field::VoltageL1 => "voltage_l1",
            Field::VoltageL2 => "voltage_l2",
            Field::VoltageL3 => "voltage_l3",
            Field::CurrentL1 => "current_l1",
            Field::CurrentL2 => "current_l2",
            Field::CurrentL3 => "current_l3",
        }
    }

    /// Unit the meter transmits this field in.
    pub fn unit(self) -> Option<&'static str> {
        match self {
            Field::Timestamp => None,
            Field::ActiveImportTotal | Field::ActiveExportTotal => Some("kWh"),
            Field::ReactiveImportTotal | Field::ReactiveExportTotal => Some("kVArh"),
            Field::ActiveImport
            | Field::ActiveExport
            | Field::ActiveImportL1
            | Field::ActiveImportL2
            | Field::ActiveImportL3
            | Field::ActiveExportL1
            | Field::ActiveExportL2
            | Field::ActiveExportL3 => Some("kW"),
            Field::ReactiveImport
            | Field::ReactiveExport
            | Field::ReactiveImportL1
            | Field::ReactiveImportL2
            | Field::ReactiveImportL3
            | Field::ReactiveExportL1
            | Field::ReactiveExportL2
            | Field::ReactiveExportL3 => Some("kVAr"),
            Field::VoltageL1 | Field::VoltageL2 | Field::VoltageL3 => Some("V"),
            Field::CurrentL1 | Field::CurrentL2 | Field::CurrentL3 => Some("A"),
        }
    }

    /// Decimal places the meter transmits for this field.
    pub fn decimals(self) -> usize {
        match self.unit() {
            None => 0,
            Some("V") | Some("A") => 1,
            Some(_) => 3,
        }
    }
}

/// How the value window of a tag is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeKind {
    /// Fixed-width decimal number, e.g. `00005996.149`.
    Decimal,
    /// `YYMMDDhhmmss` followed by a `W`/`S` daylight-saving flag.
    Timestamp,
}

/// One row of the tag table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagSpec {
    pub field: Field,
    /// Literal tag text preceding the value delimiter, e.g. `1-0:1.8.0`.
    pub tag: String,
    /// Width of the value window in bytes.
    pub width: usize,
    pub kind: DecodeKind,
}

impl TagSpec {
    pub fn new(field: Field, tag: impl Into<String>, width: usize, kind: DecodeKind) -> Self {
        Self {
            field,
            tag: tag.into(),
            width,
            kind,
        }
    }
}

/// Width of a meter timestamp window: 12 digits and the DST flag.
pub const TIMESTAMP_WIDTH: usize = 13;

const ENERGY_WIDTH: usize = 12;
const POWER_WIDTH: usize = 8;
const PHASE_WIDTH: usize = 5;

const DEFAULT_TAGS: [(Field, &str, usize); 26] = [
    (Field::ActiveImportTotal, "1-0:1.8.0", ENERGY_WIDTH),
    (Field::ActiveExportTotal, "1-0:2.8.0", ENERGY_WIDTH),
    (Field::ReactiveImportTotal, "1-0:3.8.0", ENERGY_WIDTH),
    (Field::ReactiveExportTotal, "1-0:4.8.0", ENERGY_WIDTH),
    (Field::ActiveImport, "1-0:1.7.0", POWER_WIDTH),
    (Field::ActiveExport, "1-0:2.7.0", POWER_WIDTH),
    (Field::ReactiveImport, "1-0:3.7.0", POWER_WIDTH),
    (Field::ReactiveExport, "1-0:4.7.0", POWER_WIDTH),
    (Field::ActiveImportL1, "1-0:21.7.0", POWER_WIDTH),
    (Field::ActiveImportL2, "1-0:41.7.0", POWER_WIDTH),
    (Field::ActiveImportL3, "1-0:61.7.0", POWER_WIDTH),
    (Field::ActiveExportL1, "1-0:22.7.0", POWER_WIDTH),
    (Field::ActiveExportL2, "1-0:42.7.0", POWER_WIDTH),
    (Field::ActiveExportL3, "1-0:62.7.0", POWER_WIDTH),
    (Field::ReactiveImportL1, "1-0:23.7.0", POWER_WIDTH),
    (Field::ReactiveImportL2, "1-0:43.7.0", POWER_WIDTH),
    (Field::ReactiveImportL3, "1-0:63.7.0", POWER_WIDTH),
    (Field::ReactiveExportL1, "1-0:24.7.0", POWER_WIDTH),
    (Field::ReactiveExportL2, "1-0:44.7.0", POWER_WIDTH),
    (Field::ReactiveExportL3, "1-0:64.7.0", POWER_WIDTH),
    (Field::VoltageL1, "1-0:32.7.0", PHASE_WIDTH),
    (Field::VoltageL2, "1-0:52.7.0", PHASE_WIDTH),
    (Field::VoltageL3, "1-0:72.7.0", PHASE_WIDTH),
    (Field::CurrentL1, "1-0:31.7.0", PHASE_WIDTH),
    (Field::CurrentL2, "1-0:51.7.0", PHASE_WIDTH),
    (Field::CurrentL3, "1-0:71.7.0", PHASE_WIDTH),
];

/// The full frame layout for one device profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagTable(Vec<TagSpec>);

impl TagTable {
    pub fn new(entries: Vec<TagSpec>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[TagSpec] {
        &self.0
    }

    /// The entry describing `field`, if any.
    pub fn get(&self, field: Field) -> Option<&TagSpec> {
        self.0.iter().find(|spec| spec.field == field)
    }

    /// Check that every reading field is described exactly once and sanely.
    pub fn validate(&self) -> std::result::Result<(), ProfileError> {
        let mut seen = HashSet::new();
        for spec in &self.0 {
            if !seen.insert(spec.field) {
                return Err(ProfileError::Invalid(format!(
                    "field '{}' appears more than once in the tag table",
                    spec.field.name()
                )));
            }
            if spec.tag.is_empty() {
                return Err(ProfileError::Invalid(format!(
                    "field '{}' has an empty tag",
                    spec.field.name()
                )));
            }
            if spec.width == 0 {
                return Err(ProfileError::Invalid(format!(
                    "field '{}' has a zero-width value window",
                    spec.field.name()
                )));
            }
            let timestamp_field = spec.field == Field::Timestamp;
            let timestamp_kind = spec.kind == DecodeKind::Timestamp;
            if timestamp_field != timestamp_kind {
                return Err(ProfileError::Invalid(format!(
                    "field '{}' must use the {} decode rule",
                    spec.field.name(),
                    if timestamp_field { "timestamp" } else { "decimal" }
                )));
            }
            if timestamp_kind && spec.width != TIMESTAMP_WIDTH {
                return Err(ProfileError::Invalid(format!(
                    "timestamp window must be {TIMESTAMP_WIDTH} bytes wide"
                )));
            }
        }

        if let Some(missing) = Field::ALL.iter().find(|field| !seen.contains(*field)) {
            return Err(ProfileError::Invalid(format!(
                "tag table has no entry for field '{}'",
                missing.name()
            )));
        }
        Ok(())
    }
}

impl Default for TagTable {
    fn default() -> Self {
        let mut entries = Vec::with_capacity(Field::ALL.len());
        entries.push(TagSpec::new(
            Field::Timestamp,
            "0-0:1.0.0",
            TIMESTAMP_WIDTH,
            DecodeKind::Timestamp,
        ));
        entries.extend(
            DEFAULT_TAGS
                .iter()
                .map(|(field, tag, width)| TagSpec::new(*field, *tag, *width, DecodeKind::Decimal)),
        );
        Self(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_complete() {
        let table = TagTable::default();
        assert_eq!(table.entries().len(), Field::ALL.len());
        table.validate().unwrap();
    }

    #[test]
    fn lookup_by_field() {
        let table = TagTable::default();
        let voltage = table.get(Field::VoltageL1).unwrap();
        assert_eq!(voltage.tag, "1-0:32.7.0");
        assert_eq!(voltage.width, 5);
        assert_eq!(voltage.kind, DecodeKind::Decimal);
    }

    #[test]
    fn decimals_follow_the_meter_units() {
        assert_eq!(Field::ActiveImportTotal.decimals(), 3);
        assert_eq!(Field::ReactiveImportL2.decimals(), 3);
        assert_eq!(Field::VoltageL3.decimals(), 1);
        assert_eq!(Field::CurrentL1.decimals(), 1);
        assert_eq!(Field::Timestamp.decimals(), 0);
    }

    #[test]
    fn rejects_duplicate_field() {
        let mut entries = TagTable::default().entries().to_vec();
        entries.push(TagSpec::new(
            Field::CurrentL1,
            "1-0:31.7.0",
            5,
            DecodeKind::Decimal,
        ));
        assert!(matches!(
            TagTable::new(entries).validate(),
            Err(ProfileError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_missing_field() {
        let entries: Vec<_> = TagTable::default()
            .entries()
            .iter()
            .filter(|spec| spec.field != Field::CurrentL3)
            .cloned()
            .collect();
        let err = TagTable::new(entries).validate().unwrap_err();
        assert!(err.to_string().contains("current_l3"));
    }

    #[test]
    fn rejects_timestamp_with_decimal_rule() {
        let entries: Vec<_> = TagTable::default()
            .entries()
            .iter()
            .cloned()
            .map(|mut spec| {
                if spec.field == Field::Timestamp {
                    spec.kind = DecodeKind::Decimal;
                }
                spec
            })
            .collect();
        assert!(TagTable::new(entries).validate().is_err());
    }

    #[test]
    fn table_json_roundtrip_uses_snake_case() {
        let json = serde_json::to_string(&TagTable::default()).unwrap();
        assert!(json.contains("\"field\":\"active_import_total\""));
        assert!(json.contains("\"kind\":\"timestamp\""));
        let parsed: TagTable = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TagTable::default());
    }
}
