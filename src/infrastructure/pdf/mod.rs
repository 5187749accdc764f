// ============================================================
// PDF REPORT WRITER
// ============================================================
// Lays out a ReportDocument onto US Letter pages with lopdf

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::domain::error::{AppError, Result};
use crate::domain::report::{ReportBlock, ReportDocument, Rgb, TableBlock};

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";
const CELL_PADDING: f32 = 4.0;

/// Page geometry and type sizes.
#[derive(Debug, Clone)]
pub struct PdfLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub title_size: f32,
    pub heading_size: f32,
    pub body_size: f32,
    pub row_height: f32,
    pub column_width: f32,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin: 72.0,
            title_size: 18.0,
            heading_size: 12.0,
            body_size: 10.0,
            row_height: 20.0,
            column_width: 150.0,
        }
    }
}

pub struct PdfReportWriter {
    layout: PdfLayout,
}

impl Default for PdfReportWriter {
    fn default() -> Self {
        Self::new(PdfLayout::default())
    }
}

/// Operations for each page plus the vertical cursor on the current one.
struct PageFlow<'a> {
    layout: &'a PdfLayout,
    pages: Vec<Vec<Operation>>,
    y: f32,
}

impl<'a> PageFlow<'a> {
    fn new(layout: &'a PdfLayout) -> Self {
        Self {
            layout,
            pages: vec![Vec::new()],
            y: layout.page_height - layout.margin,
        }
    }

    fn left(&self) -> f32 {
        self.layout.margin
    }

    fn content_width(&self) -> f32 {
        self.layout.page_width - 2.0 * self.layout.margin
    }

    /// Starts a new page unless `height` still fits above the bottom margin.
    /// Returns true when a break happened.
    fn ensure_space(&mut self, height: f32) -> bool {
        let at_top = self.y >= self.layout.page_height - self.layout.margin;
        if self.y - height >= self.layout.margin || at_top {
            return false;
        }
        self.pages.push(Vec::new());
        self.y = self.layout.page_height - self.layout.margin;
        true
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        // `pages` always holds at least one page.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn text(&mut self, font: &str, size: f32, x: f32, y: f32, color: Rgb, text: &str) {
        let ops = self.ops();
        ops.push(fill_color(color));
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
        ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_text(text))],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    /// Draws `text`, wrapped onto as many lines as the content width needs.
    fn line_of_text(&mut self, font: &str, size: f32, text: &str, centered: bool) {
        let line_height = size * 1.4;
        for line in wrap_text(text, size, self.content_width()) {
            self.ensure_space(line_height);
            self.y -= line_height;
            let x = if centered {
                let width = approx_text_width(&line, size);
                self.left() + ((self.content_width() - width) / 2.0).max(0.0)
            } else {
                self.left()
            };
            let y = self.y + size * 0.3;
            self.text(font, size, x, y, Rgb::BLACK, &line);
        }
    }

    fn table_row(&mut self, cells: &[String], fill: Option<Rgb>, text_color: Rgb, font: &str) {
        let (row_height, column_width, size) = (
            self.layout.row_height,
            self.layout.column_width,
            self.layout.body_size,
        );
        let width = column_width * cells.len() as f32;
        let x0 = self.left() + ((self.content_width() - width) / 2.0).max(0.0);
        self.y -= row_height;
        let y = self.y;

        for (idx, cell) in cells.iter().enumerate() {
            let x = x0 + column_width * idx as f32;
            let ops = self.ops();
            if let Some(color) = fill {
                ops.push(fill_color(color));
                ops.push(rect(x, y, column_width, row_height));
                ops.push(Operation::new("f", vec![]));
            }
            ops.push(Operation::new("RG", vec![0.0f32.into(), 0.0f32.into(), 0.0f32.into()]));
            ops.push(Operation::new("w", vec![1.0f32.into()]));
            ops.push(rect(x, y, column_width, row_height));
            ops.push(Operation::new("S", vec![]));

            let cell = fit_text(cell, size, column_width - 2.0 * CELL_PADDING);
            let text_width = approx_text_width(&cell, size);
            let tx = x + ((column_width - text_width) / 2.0).max(CELL_PADDING);
            self.text(font, size, tx, y + (row_height - size) / 2.0 + 2.0, text_color, &cell);
        }
    }

    fn table(&mut self, table: &TableBlock) {
        let row_height = self.layout.row_height;

        // Keep the header with at least one body row.
        self.ensure_space(row_height * 2.0);
        self.table_row(&table.header, Some(table.header_fill), table.header_text, FONT_BOLD);

        for row in &table.rows {
            if self.ensure_space(row_height) {
                self.table_row(&table.header, Some(table.header_fill), table.header_text, FONT_BOLD);
            }
            self.table_row(row, table.body_fill, Rgb::BLACK, FONT_REGULAR);
        }
    }
}

impl PdfReportWriter {
    pub fn new(layout: PdfLayout) -> Self {
        Self { layout }
    }

    /// Render the document to PDF bytes. Output is deterministic for equal input.
    pub fn render(&self, report: &ReportDocument) -> Result<Vec<u8>> {
        let mut flow = PageFlow::new(&self.layout);

        for block in &report.blocks {
            match block {
                ReportBlock::Title(text) => {
                    flow.line_of_text(FONT_BOLD, self.layout.title_size, text, true)
                }
                ReportBlock::Heading(text) => {
                    flow.line_of_text(FONT_BOLD, self.layout.heading_size, text, false)
                }
                ReportBlock::Paragraph(text) => {
                    flow.line_of_text(FONT_REGULAR, self.layout.body_size, text, false)
                }
                ReportBlock::Spacer(height) => {
                    if !flow.ensure_space(*height) {
                        flow.y -= height;
                    }
                }
                ReportBlock::Table(table) => flow.table(table),
            }
        }

        let pages = flow.pages;
        debug!(pages = pages.len(), "Rendered report layout");
        self.assemble(pages)
    }

    fn assemble(&self, pages: Vec<Vec<Operation>>) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(font_dictionary("Helvetica"));
        let bold_id = doc.add_object(font_dictionary("Helvetica-Bold"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                FONT_REGULAR => regular_id,
                FONT_BOLD => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for operations in pages {
            let content = Content { operations };
            let encoded = content
                .encode()
                .map_err(|e| AppError::Internal(format!("Failed to encode page content: {}", e)))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    self.layout.page_width.into(),
                    self.layout.page_height.into(),
                ],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| AppError::Internal(format!("Failed to write PDF: {}", e)))?;
        Ok(buffer)
    }
}

fn font_dictionary(base_font: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn fill_color(color: Rgb) -> Operation {
    Operation::new("rg", vec![color.0.into(), color.1.into(), color.2.into()])
}

fn rect(x: f32, y: f32, width: f32, height: f32) -> Operation {
    Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()])
}

/// Map text to single-byte WinAnsi-compatible codes; other characters become '?'.
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Rough Helvetica width: 0.6em per glyph, wide enough for most text.
fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.6
}

fn max_chars(size: f32, max_width: f32) -> usize {
    ((max_width / (size * 0.6)).floor() as usize).max(1)
}

/// Greedy word wrap. Words longer than a line are split mid-word.
fn wrap_text(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let limit = max_chars(size, max_width);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > limit {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(chars.drain(..limit).collect());
        }
        if chars.is_empty() {
            continue;
        }

        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + chars.len() > limit {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(chars);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Truncates `text` with "..." so it fits in `max_width`.
fn fit_text(text: &str, size: f32, max_width: f32) -> String {
    let limit = max_chars(size, max_width);
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{kept}...")
}
