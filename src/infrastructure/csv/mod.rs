// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Upload decoding and equipment table parsing

mod csv_parser;

pub use csv_parser::CsvParser;
