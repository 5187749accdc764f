use crate::domain::report::{ReportBlock, ReportDocument, Rgb, TableBlock};
use crate::domain::summary::{format_measure, UNIT_FLOWRATE, UNIT_PRESSURE, UNIT_TEMPERATURE};
use crate::domain::upload_record::UploadRecord;

pub const DISTRIBUTION_HEADING: &str = "Equipment Type Distribution:";

/// Lay out the report for one stored record.
///
/// Order: title, generation line, parameter table, heading, distribution table.
/// Distribution rows follow the summary's key order, which is alphabetical.
pub fn build_report(record: &UploadRecord) -> ReportDocument {
    let summary = &record.summary;
    let mut doc = ReportDocument::default();

    doc.push(ReportBlock::Title(format!(
        "Chemical Equipment Report: {}",
        record.filename
    )))
    .push(ReportBlock::Spacer(12.0))
    .push(ReportBlock::Paragraph(format!(
        "Generated on: {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S")
    )))
    .push(ReportBlock::Spacer(12.0));

    doc.push(ReportBlock::Table(TableBlock {
        header: vec!["Parameter".to_string(), "Value".to_string()],
        rows: vec![
            vec!["Total Equipment".to_string(), summary.total_count.to_string()],
            vec![
                "Average Flowrate".to_string(),
                format_measure(summary.avg_flowrate, UNIT_FLOWRATE),
            ],
            vec![
                "Average Pressure".to_string(),
                format_measure(summary.avg_pressure, UNIT_PRESSURE),
            ],
            vec![
                "Average Temperature".to_string(),
                format_measure(summary.avg_temperature, UNIT_TEMPERATURE),
            ],
        ],
        header_fill: Rgb::INDIGO,
        header_text: Rgb::WHITESMOKE,
        body_fill: Some(Rgb::BEIGE),
    }))
    .push(ReportBlock::Spacer(24.0));

    doc.push(ReportBlock::Heading(DISTRIBUTION_HEADING.to_string()))
        .push(ReportBlock::Table(TableBlock {
            header: vec!["Type".to_string(), "Count".to_string()],
            rows: summary
                .type_distribution
                .iter()
                .map(|(kind, count)| vec![kind.clone(), count.to_string()])
                .collect(),
            header_fill: Rgb::GREY,
            header_text: Rgb::BLACK,
            body_fill: None,
        }));

    doc
}
