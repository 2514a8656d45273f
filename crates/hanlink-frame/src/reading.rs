use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{FrameError, Result};
use crate::tag::Field;

/// Every value decoded from one frame.
///
/// Values are in the units the meter transmits (see [`Field::unit`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Meter time as an absolute UTC instant.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub active_import_total: f64,
    pub active_export_total: f64,
    pub reactive_import_total: f64,
    pub reactive_export_total: f64,
    pub active_import: f64,
    pub active_export: f64,
    pub reactive_import: f64,
    pub reactive_export: f64,
    pub active_import_l1: f64,
    pub active_import_l2: f64,
    pub active_import_l3: f64,
    pub active_export_l1: f64,
    pub active_export_l2: f64,
    pub active_export_l3: f64,
    pub reactive_import_l1: f64,
    pub reactive_import_l2: f64,
    pub reactive_import_l3: f64,
    pub reactive_export_l1: f64,
    pub reactive_export_l2: f64,
    pub reactive_export_l3: f64,
    pub voltage_l1: f64,
    pub voltage_l2: f64,
    pub voltage_l3: f64,
    pub current_l1: f64,
    pub current_l2: f64,
    pub current_l3: f64,
}

impl Reading {
    /// Assemble a reading; fails if any numeric field is missing.
    pub(crate) fn from_values(
        timestamp: OffsetDateTime,
        values: &BTreeMap<Field, f64>,
    ) -> Result<Self> {
        let get = |field: Field| {
            values
                .get(&field)
                .copied()
                .ok_or(FrameError::MissingField(field))
        };

        Ok(Self {
            timestamp,
            active_import_total: get(Field::ActiveImportTotal)?,
            active_export_total: get(Field::ActiveExportTotal)?,
            reactive_import_total: get(Field::ReactiveImportTotal)?,
            reactive_export_total: get(Field::ReactiveExportTotal)?,
            active_import: get(Field::ActiveImport)?,
            active_export: get(Field::ActiveExport)?,
            reactive_import: get(Field::ReactiveImport)?,
            reactive_export: get(Field::ReactiveExport)?,
            active_import_l1: get(Field::ActiveImportL1)?,
            active_import_l2: get(Field::ActiveImportL2)?,
            active_import_l3: get(Field::ActiveImportL3)?,
            active_export_l1: get(Field::ActiveExportL1)?,
            active_export_l2: get(Field::ActiveExportL2)?,
            active_export_l3: get(Field::ActiveExportL3)?,
            reactive_import_l1: get(Field::ReactiveImportL1)?,
            reactive_import_l2: get(Field::ReactiveImportL2)?,
            reactive_import_l3: get(Field::ReactiveImportL3)?,
            reactive_export_l1: get(Field::ReactiveExportL1)?,
            reactive_export_l2: get(Field::ReactiveExportL2)?,
            reactive_export_l3: get(Field::ReactiveExportL3)?,
            voltage_l1: get(Field::VoltageL1)?,
            voltage_l2: get(Field::VoltageL2)?,
            voltage_l3: get(Field::VoltageL3)?,
            current_l1: get(Field::CurrentL1)?,
            current_l2: get(Field::CurrentL2)?,
            current_l3: get(Field::CurrentL3)?,
        })
    }

    /// Numeric value of `field`; `None` for [`Field::Timestamp`].
    pub fn value(&self, field: Field) -> Option<f64> {
        let value = match field {
            Field::Timestamp => return None,
            Field::ActiveImportTotal => self.active_import_total,
            Field::ActiveExportTotal => self.active_export_total,
            Field::ReactiveImportTotal => self.reactive_import_total,
            Field::ReactiveExportTotal => self.reactive_export_total,
            Field::ActiveImport => self.active_import,
            Field::ActiveExport => self.active_export,
            Field::ReactiveImport => self.reactive_import,
            Field::ReactiveExport => self.reactive_export,
            Field::ActiveImportL1 => self.active_import_l1,
            Field::ActiveImportL2 => self.active_import_l2,
            Field::ActiveImportL3 => self.active_import_l3,
            Field::ActiveExportL1 => self.active_export_l1,
            Field::ActiveExportL2 => self.active_export_l2,
            Field::ActiveExportL3 => self.active_export_l3,
            Field::ReactiveImportL1 => self.reactive_import_l1,
            Field::ReactiveImportL2 => self.reactive_import_l2,
            Field::ReactiveImportL3 => self.reactive_import_l3,
            Field::ReactiveExportL1 => self.reactive_export_l1,
            Field::ReactiveExportL2 => self.reactive_export_l2,
            Field::ReactiveExportL3 => self.reactive_export_l3,
            Field::VoltageL1 => self.voltage_l1,
            Field::VoltageL2 => self.voltage_l2,
            Field::VoltageL3 => self.voltage_l3,
            Field::CurrentL1 => self.current_l1,
            Field::CurrentL2 => self.current_l2,
            Field::CurrentL3 => self.current_l3,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn values() -> BTreeMap<Field, f64> {
        Field::ALL
            .iter()
            .skip(1)
            .enumerate()
            .map(|(i, field)| (*field, i as f64))
            .collect()
    }

    #[test]
    fn value_matches_named_fields() {
        let reading = Reading::from_values(datetime!(2020-10-17 07:30:15 UTC), &values()).unwrap();
        assert_eq!(reading.value(Field::ActiveImportTotal), Some(0.0));
        assert_eq!(reading.value(Field::CurrentL3), Some(25.0));
        assert_eq!(reading.value(Field::Timestamp), None);
    }

    #[test]
    fn missing_value_fails_whole_reading() {
        let mut values = values();
        values.remove(&Field::VoltageL2);
        let err = Reading::from_values(datetime!(2020-10-17 07:30:15 UTC), &values).unwrap_err();
        assert!(matches!(err, FrameError::MissingField(Field::VoltageL2)));
    }

    #[test]
    fn serializes_rfc3339_timestamp() {
        let reading = Reading::from_values(datetime!(2020-10-17 07:30:15 UTC), &values()).unwrap();
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["timestamp"], "2020-10-17T07:30:15Z");
        assert_eq!(json["voltage_l1"], 20.0);
    }
}
