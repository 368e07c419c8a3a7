use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{HahnemannError, Result};
use crate::input::Field;
use crate::invoice::line::{InvoiceLine, LineDraft, LineRecord};

/// The editable billing form: an ordered list of raw rows.
///
/// Rows can be appended and edited field by field; there is no delete.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    rows: Vec<LineDraft>,
}

impl Default for InvoiceDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceDraft {
    /// A draft with one blank row, like a freshly opened billing form.
    pub fn new() -> Self {
        Self {
            rows: vec![LineDraft::default()],
        }
    }

    pub fn from_rows(rows: Vec<LineDraft>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[LineDraft] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a blank row and return its 1-based number.
    pub fn add_row(&mut self) -> usize {
        self.rows.push(LineDraft::default());
        self.rows.len()
    }

    /// Edit one field of the 1-based `row`.
    pub fn set_field(&mut self, row: usize, field: Field, value: &str) -> Result<()> {
        let count = self.rows.len();
        let draft = row
            .checked_sub(1)
            .and_then(|idx| self.rows.get_mut(idx))
            .ok_or(HahnemannError::RowNotFound { row, count })?;
        draft.set(field, value);
        Ok(())
    }

    /// Validate every row. The first bad row aborts with its 1-based number.
    pub fn validate(&self) -> Result<Vec<InvoiceLine>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, draft)| {
                draft.validate().map_err(|source| HahnemannError::InvalidLine {
                    row: idx + 1,
                    source,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct LineFile {
    #[serde(default)]
    line: Vec<LineRecord>,
}

/// Load `[[line]]` records from a TOML file and validate them.
pub fn load_line_file(path: &Path) -> Result<Vec<InvoiceLine>> {
    let content = fs::read_to_string(path)?;
    let file: LineFile = toml::from_str(&content).map_err(|e| HahnemannError::LineFileParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    file.line
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            record.validate().map_err(|source| HahnemannError::InvalidLine {
                row: idx + 1,
                source,
            })
        })
        .collect()
}

/// Collect lines from `name:qty:price[:discount]` shorthands followed by an optional line file.
pub fn collect_lines(shorthands: &[String], file: Option<&Path>) -> Result<Vec<InvoiceLine>> {
    let rows = shorthands
        .iter()
        .map(|shorthand| LineDraft::parse_shorthand(shorthand))
        .collect::<Result<Vec<_>>>()?;
    let mut lines = InvoiceDraft::from_rows(rows).validate()?;

    if let Some(path) = file {
        lines.extend(load_line_file(path)?);
    }

    if lines.is_empty() {
        return Err(HahnemannError::NoLines);
    }
    Ok(lines)
}
