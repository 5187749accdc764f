// ============================================================
// EQUIPMENT CSV PARSER
// ============================================================
// Parse uploaded CSV bytes into an EquipmentTable with schema checks

use std::borrow::Cow;

use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use tracing::debug;

use crate::domain::equipment::{
    EquipmentRow, EquipmentTable, COLUMN_FLOWRATE, COLUMN_NAME, COLUMN_PRESSURE,
    COLUMN_TEMPERATURE, COLUMN_TYPE,
};
use crate::domain::error::{AppError, Result};

/// CSV parser for equipment uploads
pub struct CsvParser {
    /// Delimiter character (default: comma)
    delimiter: u8,

    /// Whether to trim whitespace from data cells (headers are matched exactly)
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
        }
    }
}

/// Header positions of the required columns.
struct ColumnIndex {
    name: usize,
    equipment_type: usize,
    flowrate: usize,
    pressure: usize,
    temperature: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| AppError::SchemaError(column.to_string()))
        };

        Ok(Self {
            name: find(COLUMN_NAME)?,
            equipment_type: find(COLUMN_TYPE)?,
            flowrate: find(COLUMN_FLOWRATE)?,
            pressure: find(COLUMN_PRESSURE)?,
            temperature: find(COLUMN_TEMPERATURE)?,
        })
    }
}

impl CsvParser {
    /// Create a new CSV parser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether to trim whitespace
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Parse raw upload bytes into a validated table
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<EquipmentTable> {
        let content = decode_text(bytes);
        self.parse_content(&content)
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<EquipmentTable> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim { Trim::Fields } else { Trim::None })
            .flexible(true) // Short rows surface as missing values below
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        let columns = ColumnIndex::resolve(&headers)?;

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(index as u64 + 2);
            rows.push(self.parse_row(line, &columns, &record)?);
        }

        debug!(rows = rows.len(), "Parsed equipment CSV");
        EquipmentTable::new(rows)
    }

    /// Parse a single CSV row
    fn parse_row(
        &self,
        line: u64,
        columns: &ColumnIndex,
        record: &StringRecord,
    ) -> Result<EquipmentRow> {
        let text = |idx: usize| record.get(idx).unwrap_or("").to_string();

        Ok(EquipmentRow {
            name: text(columns.name),
            equipment_type: text(columns.equipment_type),
            flowrate: parse_measure(record, columns.flowrate, COLUMN_FLOWRATE, line)?,
            pressure: parse_measure(record, columns.pressure, COLUMN_PRESSURE, line)?,
            temperature: parse_measure(record, columns.temperature, COLUMN_TEMPERATURE, line)?,
        })
    }
}

fn parse_measure(record: &StringRecord, idx: usize, column: &str, line: u64) -> Result<f64> {
    let raw = record.get(idx).unwrap_or("").trim();
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(AppError::ParseError(format!(
            "Non-numeric value '{}' in column {} at line {}",
            raw, column, line
        ))),
    }
}

/// Decode upload bytes: BOM first, then strict UTF-8, then Windows-1252.
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text;
    }

    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return text;
    }

    debug!("Upload is not valid UTF-8, decoding as Windows-1252");
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature";

    #[test]
    fn test_parse_simple_csv() {
        let content = format!("{HEADER}\nPump-1,Pump,10,2,30\nValve-1,Valve,0,1.5,20");
        let table = CsvParser::new().parse_content(&content).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].name, "Pump-1");
        assert_eq!(table.rows()[0].equipment_type, "Pump");
        assert_eq!(table.rows()[1].pressure, 1.5);
    }

    #[test]
    fn test_columns_in_any_order_with_extras() {
        let content = "Temperature,Notes,Type,Pressure,Equipment Name,Flowrate\n40,x,Pump,4,P-2,20";
        let table = CsvParser::new().parse_content(content).unwrap();

        let row = &table.rows()[0];
        assert_eq!(row.name, "P-2");
        assert_eq!(row.flowrate, 20.0);
        assert_eq!(row.temperature, 40.0);
    }

    #[test]
    fn test_missing_column_is_named() {
        let content = "Equipment Name,Type,Flowrate,Temperature\nP-1,Pump,1,2";
        let err = CsvParser::new().parse_content(content).unwrap_err();
        assert_eq!(err, AppError::SchemaError("Pressure".to_string()));
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let content = "Equipment Name,type,Flowrate,Pressure,Temperature\nP-1,Pump,1,2,3";
        let err = CsvParser::new().parse_content(content).unwrap_err();
        assert_eq!(err, AppError::SchemaError("Type".to_string()));
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = CsvParser::new().parse_content(HEADER).unwrap_err();
        assert_eq!(err, AppError::EmptyInput);

        let err = CsvParser::new().parse_content(&format!("{HEADER}\n")).unwrap_err();
        assert_eq!(err, AppError::EmptyInput);
    }

    #[test]
    fn test_zero_bytes_reports_first_missing_column() {
        let err = CsvParser::new().parse_bytes(b"").unwrap_err();
        assert_eq!(err, AppError::SchemaError("Equipment Name".to_string()));
    }

    #[test]
    fn test_non_numeric_value_rejects_file() {
        let content = format!("{HEADER}\nP-1,Pump,10,2,30\nP-2,Pump,fast,2,30");
        let err = CsvParser::new().parse_content(&content).unwrap_err();
        match err {
            AppError::ParseError(msg) => {
                assert!(msg.contains("Flowrate"), "{msg}");
                assert!(msg.contains("line 3"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_numeric_cell_rejected() {
        let content = format!("{HEADER}\nP-1,Pump,10,2");
        let err = CsvParser::new().parse_content(&content).unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let content = format!("{HEADER}\nP-1,Pump,NaN,2,30");
        let err = CsvParser::new().parse_content(&content).unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_negative_and_duplicate_rows_accepted() {
        let content = format!("{HEADER}\nP-1,Pump,-5,2,-30\nP-1,Pump,5,2,30");
        let table = CsvParser::new().parse_content(&content).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].temperature, -30.0);
    }

    #[test]
    fn test_cells_trimmed() {
        let content = format!("{HEADER}\n P-1 , Pump , 10 , 2 , 30 ");
        let row = CsvParser::new().parse_content(&content).unwrap().rows()[0].clone();
        assert_eq!(row.equipment_type, "Pump");
        assert_eq!(row.flowrate, 10.0);
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(format!("{HEADER}\nP-1,Pump,1,2,3").as_bytes());
        let table = CsvParser::new().parse_bytes(&bytes).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_windows_1252_fallback() {
        let mut bytes = format!("{HEADER}\n").into_bytes();
        bytes.extend_from_slice(b"Kessel \xE9,Boiler,1,2,3");
        let table = CsvParser::new().parse_bytes(&bytes).unwrap();
        assert_eq!(table.rows()[0].name, "Kessel \u{e9}");
    }

    #[test]
    fn test_custom_delimiter() {
        let content = "Equipment Name;Type;Flowrate;Pressure;Temperature\nP-1;Pump;1,5;2;3";
        let err = CsvParser::new()
            .with_delimiter(b';')
            .parse_content(content)
            .unwrap_err();
        // Decimal commas are not numbers.
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_headers_must_match_exactly() {
        let content = "Equipment Name, Type,Flowrate,Pressure,Temperature\nP-1,Pump,1,2,3";
        let err = CsvParser::new().parse_content(content).unwrap_err();
        assert_eq!(err, AppError::SchemaError("Type".to_string()));
    }

    #[test]
    fn test_trim_setting_applies_to_cells() {
        let content = format!("{HEADER}\n P-1 ,Pump,1,2,3");

        let trimmed = CsvParser::new().parse_content(&content).unwrap();
        assert_eq!(trimmed.rows()[0].name, "P-1");

        let raw = CsvParser::new()
            .with_trim(false)
            .parse_content(&content)
            .unwrap();
        assert_eq!(raw.rows()[0].name, " P-1 ");
    }
}
