// ============================================================
// EQUIPMENT TABLE TYPES
// ============================================================
// Parsed equipment rows. No I/O, no async.

use serde::{Deserialize, Serialize};

use super::error::{AppError, Result};

pub const COLUMN_NAME: &str = "Equipment Name";
pub const COLUMN_TYPE: &str = "Type";
pub const COLUMN_FLOWRATE: &str = "Flowrate";
pub const COLUMN_PRESSURE: &str = "Pressure";
pub const COLUMN_TEMPERATURE: &str = "Temperature";

/// Columns every upload must carry, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COLUMN_NAME,
    COLUMN_TYPE,
    COLUMN_FLOWRATE,
    COLUMN_PRESSURE,
    COLUMN_TEMPERATURE,
];

/// One equipment record from an uploaded CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRow {
    pub name: String,
    /// Category used for the type distribution.
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

/// Non-empty, immutable sequence of rows from one upload.
#[derive(Debug, Clone)]
pub struct EquipmentTable {
    rows: Vec<EquipmentRow>,
}

impl EquipmentTable {
    /// Builds a table, rejecting zero rows so downstream means are always defined.
    pub fn new(rows: Vec<EquipmentRow>) -> Result<Self> {
        if rows.is_empty() {
            return Err(AppError::EmptyInput);
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[EquipmentRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false; kept for the `len` convention.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_rejected() {
        let err = EquipmentTable::new(Vec::new()).unwrap_err();
        assert_eq!(err, AppError::EmptyInput);
    }

    #[test]
    fn test_table_keeps_row_order() {
        let rows = vec![
            EquipmentRow {
                name: "P-1".into(),
                equipment_type: "Pump".into(),
                flowrate: 1.0,
                pressure: 2.0,
                temperature: 3.0,
            },
            EquipmentRow {
                name: "V-1".into(),
                equipment_type: "Valve".into(),
                flowrate: 4.0,
                pressure: 5.0,
                temperature: 6.0,
            },
        ];
        let table = EquipmentTable::new(rows).unwrap();
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
        assert_eq!(table.rows()[1].name, "V-1");
    }
}
