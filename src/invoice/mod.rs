mod assembler;
mod draft;
mod line;

pub use assembler::{
    assemble, default_output_path, export_invoice, ExportSummary, InvoiceLayout, WatermarkMode,
    TABLE_HEAD,
};
pub use draft::{collect_lines, load_line_file, InvoiceDraft};
pub use line::{
    format_money, format_percent, grand_total, InvoiceLine, LineDraft, LineRecord, LineResult,
};
