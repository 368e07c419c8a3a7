//! Page layout for generated documents.
//!
//! Everything here works in millimetres with the origin at the top-left
//! corner of the page and `y` growing downwards. The output is a list of
//! backend-neutral draw operations per page; `crate::pdf` turns them into a
//! PDF.
//!
//! Tables paginate themselves: when the next row would cross the bottom
//! margin a new page is started and the header row is repeated. After the
//! last row on *each* page, the caller's [`PageHook`] runs with the position
//! of that row, so page-scoped annotations (running totals, "continued"
//! notes) can be placed right under the table.

use tracing::trace;

/// Millimetres per typographic point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

/// Average Helvetica glyph advance, as a fraction of the font size.
const AVG_GLYPH_WIDTH_EM: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    /// Margin applied on every side.
    pub margin: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin: 14.11,
    };

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn bottom_limit(&self) -> f32 {
        self.height - self.margin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// An RGB8 raster, already flattened onto a white background.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width_px: u32,
    pub height_px: u32,
    pub rgb: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
    },
    Rule {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
    },
    /// `asset` indexes [`Document::assets`]; `(x, y)` is the top-left corner.
    Image {
        asset: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    number: usize,
    ops: Vec<DrawOp>,
}

impl Page {
    fn new(number: usize) -> Self {
        Self {
            number,
            ops: Vec::new(),
        }
    }

    /// 1-based page number.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn text(&mut self, text: impl Into<String>, x: f32, y: f32, size: f32, weight: FontWeight) {
        self.ops.push(DrawOp::Text {
            text: text.into(),
            x,
            y,
            size,
            weight,
        });
    }

    pub fn rule(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32) {
        self.ops.push(DrawOp::Rule {
            x1,
            y1,
            x2,
            y2,
            thickness,
        });
    }

    /// Texts on this page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// What the table did on one page, handed to [`PageHook::did_draw_page`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTableInfo {
    pub page_number: usize,
    /// Index into the body of the first row drawn on this page.
    pub first_row: usize,
    pub rows_drawn: usize,
    /// Bottom edge of the last row drawn on this page.
    pub cursor_y: f32,
}

/// Runs once per page a table spans, after the table's last row on that page.
pub trait PageHook {
    fn did_draw_page(&mut self, page: &mut Page, info: &PageTableInfo);
}

impl<F> PageHook for F
where
    F: FnMut(&mut Page, &PageTableInfo),
{
    fn did_draw_page(&mut self, page: &mut Page, info: &PageTableInfo) {
        self(page, info)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStyle {
    /// Font size in points.
    pub font_size: f32,
    pub row_height: f32,
    pub cell_padding: f32,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            row_height: 8.0,
            cell_padding: 1.76,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableSpec {
    pub head: Vec<String>,
    pub body: Vec<Vec<String>>,
    /// Relative column widths; one per header cell.
    pub column_weights: Vec<f32>,
    /// Top of the table on the page it starts on. Continuation pages start at the margin.
    pub start_y: f32,
    pub style: TableStyle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableSummary {
    pub first_page: usize,
    pub last_page: usize,
    pub cursor_y: f32,
}

impl TableSummary {
    pub fn pages_spanned(&self) -> usize {
        self.last_page - self.first_page + 1
    }
}

/// A multi-page document under construction.
#[derive(Debug, Clone)]
pub struct Document {
    geometry: PageGeometry,
    pages: Vec<Page>,
    assets: Vec<Raster>,
}

impl Document {
    /// A document with one empty page.
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::new(1)],
            assets: Vec::new(),
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn assets(&self) -> &[Raster] {
        &self.assets
    }

    pub fn current_page(&mut self) -> &mut Page {
        let idx = self.pages.len() - 1;
        &mut self.pages[idx]
    }

    pub fn add_page(&mut self) -> &mut Page {
        let number = self.pages.len() + 1;
        self.pages.push(Page::new(number));
        self.current_page()
    }

    /// Register an image and return the index draw ops refer to it by.
    pub fn add_asset(&mut self, raster: Raster) -> usize {
        self.assets.push(raster);
        self.assets.len() - 1
    }

    /// Put `op` underneath everything already on every page.
    pub fn stamp_every_page(&mut self, op: DrawOp) {
        for page in &mut self.pages {
            page.ops.insert(0, op.clone());
        }
    }

    /// Lay `table` out from the current page onwards, calling `hook` once per page.
    pub fn draw_table(&mut self, table: &TableSpec, hook: &mut dyn PageHook) -> TableSummary {
        let geometry = self.geometry;
        let style = table.style;
        let columns = column_edges(&table.column_weights, geometry.margin, geometry.content_width());
        let limit = geometry.bottom_limit();

        let first_page = self.pages.len();
        let mut y = table.start_y;
        draw_row(self.current_page(), &table.head, &columns, y, style, FontWeight::Bold);
        y += style.row_height;

        let mut first_row = 0;
        let mut rows_drawn = 0;

        for (idx, row) in table.body.iter().enumerate() {
            // A row taller than an empty page still goes somewhere.
            if y + style.row_height > limit && rows_drawn > 0 {
                self.finish_page(hook, first_row, rows_drawn, y);

                self.add_page();
                y = geometry.margin;
                draw_row(self.current_page(), &table.head, &columns, y, style, FontWeight::Bold);
                y += style.row_height;
                first_row = idx;
                rows_drawn = 0;
            }

            draw_row(self.current_page(), row, &columns, y, style, FontWeight::Regular);
            y += style.row_height;
            rows_drawn += 1;
        }

        self.finish_page(hook, first_row, rows_drawn, y);

        TableSummary {
            first_page,
            last_page: self.pages.len(),
            cursor_y: y,
        }
    }

    fn finish_page(&mut self, hook: &mut dyn PageHook, first_row: usize, rows_drawn: usize, y: f32) {
        let page = self.current_page();
        let info = PageTableInfo {
            page_number: page.number,
            first_row,
            rows_drawn,
            cursor_y: y,
        };
        trace!(page = info.page_number, rows = rows_drawn, cursor_y = y, "table page done");
        hook.did_draw_page(page, &info);
    }
}

/// Left edges of each column plus the right edge of the last one.
fn column_edges(weights: &[f32], left: f32, width: f32) -> Vec<f32> {
    let total: f32 = weights.iter().sum();
    let mut edges = Vec::with_capacity(weights.len() + 1);
    let mut x = left;
    edges.push(x);
    for w in weights {
        x += width * w / total;
        edges.push(x);
    }
    edges
}

fn draw_row(page: &mut Page, cells: &[String], edges: &[f32], top: f32, style: TableStyle, weight: FontWeight) {
    let size_mm = style.font_size * MM_PER_PT;
    let baseline = top + style.row_height / 2.0 + size_mm * 0.35;

    for (col, cell) in cells.iter().enumerate().take(edges.len().saturating_sub(1)) {
        let left = edges[col];
        let width = edges[col + 1] - left - 2.0 * style.cell_padding;
        page.text(
            fit_text(cell, width, style.font_size),
            left + style.cell_padding,
            baseline,
            style.font_size,
            weight,
        );
    }

    let (x1, x2) = (edges[0], edges[edges.len() - 1]);
    let bottom = top + style.row_height;
    let thickness = if weight == FontWeight::Bold { 0.4 } else { 0.1 };
    page.rule(x1, bottom, x2, bottom, thickness);
}

/// Estimated rendered width of `text` in millimetres.
pub fn text_width(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * size_pt * AVG_GLYPH_WIDTH_EM * MM_PER_PT
}

/// Shorten `text` with a trailing "..." so it fits in `max_width` millimetres.
pub fn fit_text(text: &str, max_width: f32, size_pt: f32) -> String {
    if text_width(text, size_pt) <= max_width {
        return text.to_string();
    }
    let glyph = size_pt * AVG_GLYPH_WIDTH_EM * MM_PER_PT;
    let keep = ((max_width / glyph).floor() as usize).saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
