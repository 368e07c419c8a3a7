use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{resolve_path, Config};
use crate::error::Result;
use crate::invoice::line::{format_money, grand_total, InvoiceLine};
use crate::layout::{
    text_width, Document, DrawOp, FontWeight, Page, PageGeometry, PageTableInfo, Raster, TableSpec,
    TableStyle,
};
use crate::pdf;
use crate::watermark::{self, WatermarkSource};

pub const TABLE_HEAD: [&str; 5] = ["Medicine", "Quantity", "Price", "Discount", "Total"];

const TITLE_X: f32 = 14.0;
const TITLE_Y: f32 = 22.0;
const TITLE_SIZE: f32 = 18.0;
const TABLE_START_Y: f32 = 30.0;
const BODY_SIZE: f32 = 12.0;
/// Gap between a page's last table row and its grand-total line.
const TOTAL_OFFSET: f32 = 10.0;

/// Fixed-layout knobs taken from `[invoice]` and `[pdf]`.
#[derive(Debug, Clone)]
pub struct InvoiceLayout {
    pub title: String,
    pub currency_label: String,
    pub issued_on: String,
    pub watermark_x: f32,
    pub watermark_y: f32,
    pub watermark_size: f32,
}

impl InvoiceLayout {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.invoice.title.clone(),
            currency_label: config.invoice.currency_label.clone(),
            issued_on: Local::now().format("%d %B %Y").to_string(),
            watermark_x: config.pdf.watermark_x,
            watermark_y: config.pdf.watermark_y,
            watermark_size: config.pdf.watermark_size,
        }
    }
}

/// Lay out the invoice for `lines`. Pure: no I/O happens here.
pub fn assemble(lines: &[InvoiceLine], layout: &InvoiceLayout, watermark: Option<Raster>) -> Document {
    let mut doc = Document::new(PageGeometry::A4);
    let geometry = doc.geometry();

    let page = doc.current_page();
    page.text(layout.title.as_str(), TITLE_X, TITLE_Y, TITLE_SIZE, FontWeight::Bold);
    let date = format!("Date: {}", layout.issued_on);
    let date_x = geometry.width - geometry.margin - text_width(&date, 10.0);
    page.text(date, date_x, TITLE_Y, 10.0, FontWeight::Regular);

    let table = TableSpec {
        head: TABLE_HEAD.iter().map(|h| h.to_string()).collect(),
        body: lines
            .iter()
            .map(|line| line.result(&layout.currency_label).cells(&layout.currency_label))
            .collect(),
        column_weights: vec![2.6, 1.0, 1.5, 1.1, 1.6],
        start_y: TABLE_START_Y,
        style: TableStyle::default(),
    };

    let total_text = format!(
        "Grand Total: {}",
        format_money(grand_total(lines), &layout.currency_label)
    );
    let mut stamp_total = |page: &mut Page, info: &PageTableInfo| {
        page.text(
            total_text.as_str(),
            TITLE_X,
            info.cursor_y + TOTAL_OFFSET,
            BODY_SIZE,
            FontWeight::Regular,
        );
    };
    let summary = doc.draw_table(&table, &mut stamp_total);
    debug!(rows = lines.len(), pages = summary.pages_spanned(), "invoice table laid out");

    if let Some(raster) = watermark {
        let asset = doc.add_asset(raster);
        doc.stamp_every_page(DrawOp::Image {
            asset,
            x: layout.watermark_x,
            y: layout.watermark_y,
            width: layout.watermark_size,
            height: layout.watermark_size,
        });
    }

    doc
}

/// Whether the export stamps the configured watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkMode {
    Configured,
    Skip,
}

#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub lines: usize,
    pub pages: usize,
    pub grand_total: f64,
    pub currency_label: String,
}

/// Default export location: `<output_dir>/<file_name>`.
pub fn default_output_path(config: &Config, cfg_dir: &Path) -> PathBuf {
    resolve_path(&config.pdf.output_dir, cfg_dir).join(&config.invoice.file_name)
}

/// Load the watermark, lay out `lines`, render the PDF and write it.
///
/// A watermark that fails to load, or takes longer than the configured
/// timeout, aborts the export before anything is written.
pub fn export_invoice(
    cfg_dir: &Path,
    config: &Config,
    lines: &[InvoiceLine],
    output_path: Option<PathBuf>,
    mode: WatermarkMode,
) -> Result<ExportSummary> {
    config.pdf.validate()?;
    let watermark = match mode {
        WatermarkMode::Configured => {
            let source = WatermarkSource::from_setting(&config.pdf.watermark, cfg_dir);
            let timeout = Duration::from_secs(config.pdf.watermark_timeout_secs);
            Some(watermark::load(&source, timeout, config.pdf.watermark_opacity)?)
        }
        WatermarkMode::Skip => None,
    };

    let layout = InvoiceLayout::from_config(config);
    let doc = assemble(lines, &layout, watermark);
    let bytes = pdf::render(&doc, &layout.title)?;

    let path = output_path.unwrap_or_else(|| default_output_path(config, cfg_dir));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, bytes)?;

    let summary = ExportSummary {
        path,
        lines: lines.len(),
        pages: doc.pages().len(),
        grand_total: grand_total(lines),
        currency_label: layout.currency_label,
    };
    info!(path = %summary.path.display(), lines = summary.lines, pages = summary.pages, "invoice exported");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HahnemannError;

    fn layout() -> InvoiceLayout {
        InvoiceLayout {
            title: "The Hahnemann Invoice".into(),
            currency_label: "INR".into(),
            issued_on: "19 October 2026".into(),
            watermark_x: 30.0,
            watermark_y: 50.0,
            watermark_size: 150.0,
        }
    }

    fn line(name: &str, quantity: u32, price: f64, discount: f64) -> InvoiceLine {
        InvoiceLine {
            name: name.into(),
            quantity,
            price,
            discount,
        }
    }

    fn grand_total_lines(page: &Page) -> Vec<(String, f32)> {
        page.ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, y, .. } if text.starts_with("Grand Total") => {
                    Some((text.clone(), *y))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn single_page_invoice_has_title_table_and_total() {
        let lines = [line("A", 2, 100.0, 0.0), line("B", 1, 50.0, 50.0)];
        let doc = assemble(&lines, &layout(), None);

        assert_eq!(doc.pages().len(), 1);
        let texts: Vec<_> = doc.pages()[0].texts().collect();
        assert_eq!(texts[0], "The Hahnemann Invoice");
        assert_eq!(texts[1], "Date: 19 October 2026");
        assert_eq!(&texts[2..7], TABLE_HEAD);
        assert_eq!(&texts[7..12], ["A", "2", "INR 100.00", "0%", "INR 200.00"]);
        assert_eq!(&texts[12..17], ["B", "1", "INR 50.00", "50%", "INR 25.00"]);

        // Header at 30, two 8mm rows, then the total 10mm below the last one.
        assert_eq!(
            grand_total_lines(&doc.pages()[0]),
            [("Grand Total: INR 225.00".to_string(), 64.0)]
        );
    }

    #[test]
    fn every_page_gets_its_own_total_line() {
        let lines: Vec<_> = (0..80).map(|i| line(&format!("Remedy {i}"), 1, 10.0, 0.0)).collect();
        let doc = assemble(&lines, &layout(), None);

        assert!(doc.pages().len() >= 3);
        for page in doc.pages() {
            let totals = grand_total_lines(page);
            assert_eq!(totals.len(), 1, "page {}", page.number());
            assert_eq!(totals[0].0, "Grand Total: INR 800.00");
            assert_eq!(page.texts().filter(|t| *t == "Medicine").count(), 1);
        }
        assert_eq!(doc.pages()[0].texts().next(), Some("The Hahnemann Invoice"));
        assert!(doc.pages()[1]
            .texts()
            .all(|t| t != "The Hahnemann Invoice"));
    }

    #[test]
    fn empty_invoice_totals_zero() {
        let doc = assemble(&[], &layout(), None);
        assert_eq!(
            grand_total_lines(&doc.pages()[0]),
            [("Grand Total: INR 0.00".to_string(), 48.0)]
        );
    }

    #[test]
    fn watermark_is_stamped_under_every_page() {
        let lines: Vec<_> = (0..40).map(|i| line(&format!("R{i}"), 1, 1.0, 0.0)).collect();
        let raster = Raster {
            width_px: 1,
            height_px: 1,
            rgb: vec![240, 240, 240],
        };
        let doc = assemble(&lines, &layout(), Some(raster));

        assert_eq!(doc.assets().len(), 1);
        assert_eq!(doc.pages().len(), 2);
        for page in doc.pages() {
            assert_eq!(
                page.ops()[0],
                DrawOp::Image {
                    asset: 0,
                    x: 30.0,
                    y: 50.0,
                    width: 150.0,
                    height: 150.0
                }
            );
        }
    }

    #[test]
    fn export_writes_the_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        crate::watermark::write_default(&dir.path().join("watermark.png")).unwrap();

        let summary = export_invoice(
            dir.path(),
            &config,
            &[line("Paracetamol", 10, 5.0, 10.0)],
            None,
            WatermarkMode::Configured,
        )
        .unwrap();

        assert_eq!(summary.path, dir.path().join("output").join("invoice.pdf"));
        assert_eq!(summary.grand_total, 45.0);
        assert_eq!(summary.pages, 1);
        let bytes = fs::read(&summary.path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn missing_watermark_aborts_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();

        let err = export_invoice(
            dir.path(),
            &config,
            &[line("Paracetamol", 10, 5.0, 10.0)],
            None,
            WatermarkMode::Configured,
        )
        .unwrap_err();

        assert!(matches!(err, HahnemannError::WatermarkLoad { .. }));
        assert!(!default_output_path(&config, dir.path()).exists());
    }

    #[test]
    fn slow_watermark_aborts_without_writing() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept() {
                held.push(stream);
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.pdf.watermark = format!("http://{addr}/watermark.png");
        config.pdf.watermark_timeout_secs = 1;

        let err = export_invoice(
            dir.path(),
            &config,
            &[line("Paracetamol", 10, 5.0, 10.0)],
            None,
            WatermarkMode::Configured,
        )
        .unwrap_err();

        assert!(matches!(err, HahnemannError::WatermarkTimeout { secs: 1, .. }));
        assert!(!default_output_path(&config, dir.path()).exists());
    }

    #[test]
    fn invalid_pdf_settings_abort_the_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.pdf.watermark_size = 0.0;

        let err = export_invoice(
            dir.path(),
            &config,
            &[line("Arnica", 1, 1.0, 0.0)],
            None,
            WatermarkMode::Skip,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            HahnemannError::InvalidSetting {
                key: "watermark_size",
                ..
            }
        ));
    }

    #[test]
    fn watermark_can_be_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("custom.pdf");
        let summary = export_invoice(
            dir.path(),
            &Config::default(),
            &[line("Arnica", 1, 1.0, 0.0)],
            Some(out.clone()),
            WatermarkMode::Skip,
        )
        .unwrap();
        assert_eq!(summary.path, out);
        assert!(out.exists());
    }
}
