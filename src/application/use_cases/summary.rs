use std::collections::BTreeMap;

use crate::domain::equipment::{
    EquipmentRow, EquipmentTable, COLUMN_FLOWRATE, COLUMN_PRESSURE, COLUMN_TEMPERATURE,
};
use crate::domain::error::{AppError, Result};
use crate::domain::summary::Summary;

/// Reduce a table to counts, column means and the type distribution.
///
/// `EquipmentTable` is never empty, so every mean divides by at least one.
/// Fails with `ParseError` if a mean is not representable as a finite f64.
pub fn summarize(table: &EquipmentTable) -> Result<Summary> {
    let rows = table.rows();

    let mut type_distribution: BTreeMap<String, u64> = BTreeMap::new();
    for row in rows {
        *type_distribution
            .entry(row.equipment_type.clone())
            .or_insert(0) += 1;
    }

    Ok(Summary {
        total_count: rows.len() as u64,
        avg_flowrate: column_mean(rows, COLUMN_FLOWRATE, |r| r.flowrate)?,
        avg_pressure: column_mean(rows, COLUMN_PRESSURE, |r| r.pressure)?,
        avg_temperature: column_mean(rows, COLUMN_TEMPERATURE, |r| r.temperature)?,
        type_distribution,
    })
}

fn column_mean(
    rows: &[EquipmentRow],
    column: &str,
    value: impl Fn(&EquipmentRow) -> f64,
) -> Result<f64> {
    let count = rows.len() as f64;
    let sum: f64 = rows.iter().map(&value).sum();

    // Plain sum overflowed; scale each value first.
    let mean = if sum.is_finite() {
        sum / count
    } else {
        rows.iter().map(|r| value(r) / count).sum()
    };

    if mean.is_finite() {
        Ok(mean)
    } else {
        Err(AppError::ParseError(format!(
            "Average of column {} is out of range",
            column
        )))
    }
}
