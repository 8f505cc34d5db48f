//! Shared table, merge and write specification models.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::conf::C_BACKUP_INFIX;
use crate::error::{Result, XlsxExpandError};
use crate::util::{derive_text_from_number, select_indices_from_names, validate_unique_columns};

////////////////////////////////////////////////////////////////////////////////
// #region CellAndTable

/// Normalized cell value; non-text source cells are coerced to text on load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnumCellValue {
    /// Absent/blank cell.
    #[default]
    Missing,
    /// Text value (possibly empty, possibly multi-line).
    Text(String),
    /// Numeric source cell, held as its canonical text
    /// (see [`crate::util::derive_text_from_number`]).
    Numeric(String),
}

impl EnumCellValue {
    /// View as text, mapping `Missing` to the empty string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Missing => "",
            Self::Text(s) | Self::Numeric(s) => s,
        }
    }

    /// `true` for `Missing` and for empty text.
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Map `Missing` to empty text; text and numbers pass through unchanged.
    pub fn into_text(self) -> Self {
        match self {
            Self::Missing => Self::Text(String::new()),
            value => value,
        }
    }

    /// Numeric value of a cell that was a number in the source.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Numeric(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Numeric(derive_text_from_number(value))
    }
}

impl fmt::Display for EnumCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory table: ordered column names and positionally aligned rows.
///
/// Every row has exactly one cell per column and column names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecTable {
    columns: Vec<String>,
    rows: Vec<Vec<EnumCellValue>>,
}

impl SpecTable {
    /// Build a table, rejecting duplicate columns and ragged rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<EnumCellValue>>) -> Result<Self> {
        validate_unique_columns(&columns)?;
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(XlsxExpandError::RowWidthMismatch {
                    row_idx,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from string literals; test and fixture helper.
    pub fn from_text_rows(columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        Self::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|v| EnumCellValue::from(*v)).collect())
                .collect(),
        )
    }

    /// Ordered column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in table order.
    pub fn rows(&self) -> &[Vec<EnumCellValue>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Zero-based index of `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (`row_idx`, `col_idx`), or `None` outside the table.
    pub fn cell(&self, row_idx: usize, col_idx: usize) -> Option<&EnumCellValue> {
        self.rows.get(row_idx)?.get(col_idx)
    }

    /// Cell text for indices already checked against the table.
    pub(crate) fn text(&self, row_idx: usize, col_idx: usize) -> &str {
        self.rows[row_idx][col_idx].as_str()
    }

    /// Fail with [`XlsxExpandError::ColumnIndexOutOfRange`] unless every
    /// index addresses a column.
    pub fn validate_column_indices(&self, cols_idx: &[usize]) -> Result<()> {
        match cols_idx.iter().find(|&&col_idx| col_idx >= self.width()) {
            Some(&col_idx) => Err(XlsxExpandError::ColumnIndexOutOfRange {
                col_idx,
                width: self.width(),
            }),
            None => Ok(()),
        }
    }
}

/// Static fixed/variable classification of a table's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumnPartition {
    /// Sorted indices of columns copied verbatim onto every derived row.
    pub cols_idx_fixed: Vec<usize>,
    /// Sorted indices of columns split on embedded line breaks.
    pub cols_idx_variable: Vec<usize>,
}

impl SpecColumnPartition {
    /// Classify `columns`: names in `cols_fixed` are fixed, all others variable.
    pub fn from_fixed_names(columns: &[String], cols_fixed: &[String]) -> Result<Self> {
        let cols_idx_fixed = select_indices_from_names(columns, cols_fixed)?;
        let cols_idx_variable = (0..columns.len())
            .filter(|idx| !cols_idx_fixed.contains(idx))
            .collect();
        Ok(Self {
            cols_idx_fixed,
            cols_idx_variable,
        })
    }

    pub fn is_fixed(&self, col_idx: usize) -> bool {
        self.cols_idx_fixed.binary_search(&col_idx).is_ok()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MergeSpecification

/// Vertical merge plan item over expanded data rows.
///
/// Row indices are zero-based over data rows (header excluded) and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecMergeRange {
    /// Column index in the expanded table.
    pub col_idx: usize,
    /// Column name, kept for diagnostics.
    pub col_name: String,
    /// First data row (inclusive).
    pub row_start: usize,
    /// Last data row (inclusive).
    pub row_end: usize,
}

impl SpecMergeRange {
    /// Number of rows the union covers; zero for an inverted range.
    pub fn n_rows(&self) -> usize {
        (self.row_end + 1).saturating_sub(self.row_start)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell alignment translated to `rust_xlsxwriter::Format` at write time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
}

impl SpecCellFormat {
    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WorkbookSnapshot

/// Raw value grid of a sheet that is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSheetGrid {
    /// Sheet name as found in the source workbook.
    pub sheet_name: String,
    /// Zero-based (row, col) of the top-left cell of `rows`.
    pub origin: (usize, usize),
    /// Cell values, row-major.
    pub rows: Vec<Vec<EnumCellValue>>,
}

/// Everything read from the source workbook that the writer needs to rebuild it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecWorkbookSnapshot {
    /// Sheet names in workbook order.
    pub sheet_names: Vec<String>,
    /// Name of the sheet being transformed.
    pub sheet_name_target: String,
    /// Target sheet as a table.
    pub table: SpecTable,
    /// Every other sheet, in workbook order.
    pub sheets_sibling: Vec<SpecSheetGrid>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region JobAndWriteOptions

/// Writer-wide options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxWriteOptions {
    /// Write cells that were numbers in the source back as numbers;
    /// otherwise every cell is written as text.
    pub if_keep_numeric_cells: bool,
    /// Re-emit sibling sheets (values only) when rebuilding the workbook.
    pub if_keep_sibling_sheets: bool,
}

impl Default for SpecXlsxWriteOptions {
    fn default() -> Self {
        Self {
            if_keep_numeric_cells: true,
            if_keep_sibling_sheets: true,
        }
    }
}

/// One end-to-end expand/merge run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExpandJob {
    /// Source workbook.
    pub file_in: PathBuf,
    /// Destination workbook; `None` overwrites `file_in`.
    pub file_out: Option<PathBuf>,
    /// Sheet to transform.
    pub sheet_name: String,
    /// Ordered fixed-column names.
    pub cols_fixed: Vec<String>,
    /// Ordered merge-key column names (subset of `cols_fixed`).
    pub cols_merge_key: Vec<String>,
    /// Copy `file_in` aside before it is overwritten.
    pub if_backup: bool,
    /// Renderer options.
    pub write_options: SpecXlsxWriteOptions,
}

impl SpecExpandJob {
    /// Resolved output path.
    pub fn path_out(&self) -> &Path {
        self.file_out.as_deref().unwrap_or(&self.file_in)
    }

    /// Backup path next to the input: `dir/tags.xlsx` -> `dir/tags.bak.xlsx`.
    pub fn path_backup(&self) -> PathBuf {
        let c_stem = self
            .file_in
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let c_name = match self.file_in.extension() {
            Some(ext) => format!("{c_stem}.{C_BACKUP_INFIX}.{}", ext.to_string_lossy()),
            None => format!("{c_stem}.{C_BACKUP_INFIX}"),
        };
        self.file_in.with_file_name(c_name)
    }

    /// `true` when the run rewrites its own input.
    pub fn if_overwrites_input(&self) -> bool {
        self.path_out() == self.file_in.as_path()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-run report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Transformed sheet.
    pub sheet_name: String,
    /// Written workbook.
    pub file_out: PathBuf,
    /// Data rows before expansion.
    pub n_rows_in: usize,
    /// Data rows after expansion.
    pub n_rows_out: usize,
    /// Applied vertical merges.
    pub merges: Vec<SpecMergeRange>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} sheet={} rows_in={} rows_out={} merges={} warnings={}",
            self.sheet_name,
            self.n_rows_in,
            self.n_rows_out,
            self.merges.len(),
            self.warnings.len()
        )
    }
}

impl fmt::Display for SpecXlsxReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[EXPAND]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
