// ============================================================
// REPORT LAYOUT MODEL
// ============================================================
// Format-neutral description of a rendered report

use serde::{Deserialize, Serialize};

/// Header row color of a table, as RGB in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const INDIGO: Rgb = Rgb(0.294, 0.0, 0.510);
    pub const GREY: Rgb = Rgb(0.5, 0.5, 0.5);
    pub const BEIGE: Rgb = Rgb(0.961, 0.961, 0.863);
    pub const WHITESMOKE: Rgb = Rgb(0.961, 0.961, 0.961);
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub header_fill: Rgb,
    pub header_text: Rgb,
    pub body_fill: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportBlock {
    Title(String),
    Paragraph(String),
    Heading(String),
    Table(TableBlock),
    Spacer(f32),
}

/// Ordered blocks; the renderer decides page breaks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub blocks: Vec<ReportBlock>,
}

impl ReportDocument {
    pub fn push(&mut self, block: ReportBlock) -> &mut Self {
        self.blocks.push(block);
        self
    }
}
