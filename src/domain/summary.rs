use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const UNIT_FLOWRATE: &str = "m3/h";
pub const UNIT_PRESSURE: &str = "bar";
pub const UNIT_TEMPERATURE: &str = "C";

/// Aggregate statistics for one uploaded table.
///
/// Values are stored unrounded; see [`format_measure`] for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_count: u64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    /// Row count per distinct Type value, keyed alphabetically.
    pub type_distribution: BTreeMap<String, u64>,
}

impl Summary {
    /// `total_count` must equal the sum of the distribution counts.
    pub fn is_consistent(&self) -> bool {
        self.type_distribution.values().sum::<u64>() == self.total_count
    }
}

/// Two-decimal presentation of a measured average, e.g. `12.35 bar`.
pub fn format_measure(value: f64, unit: &str) -> String {
    format!("{:.2} {}", value, unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_measure_rounds_for_display_only() {
        assert_eq!(format_measure(2.333333, UNIT_PRESSURE), "2.33 bar");
        assert_eq!(format_measure(10.0, UNIT_FLOWRATE), "10.00 m3/h");
        assert_eq!(format_measure(29.996, UNIT_TEMPERATURE), "30.00 C");
    }

    #[test]
    fn test_consistency_check() {
        let mut summary = Summary {
            total_count: 3,
            avg_flowrate: 0.0,
            avg_pressure: 0.0,
            avg_temperature: 0.0,
            type_distribution: BTreeMap::from([("Pump".to_string(), 2), ("Valve".to_string(), 1)]),
        };
        assert!(summary.is_consistent());
        summary.total_count = 4;
        assert!(!summary.is_consistent());
    }
}
