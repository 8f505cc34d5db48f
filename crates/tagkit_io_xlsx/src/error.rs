//! Top-level error type for the expand/merge kernel.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum XlsxExpandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XLSX read error: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("DataFrame error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),

    #[error("Sheet not found: {sheet_name:?} in {}", path.display())]
    SheetNotFound { path: PathBuf, sheet_name: String },

    #[error("Sheet {0:?} has no header row")]
    EmptySheet(String),

    #[error("Row {row_idx} has {found} cells; header has {expected} columns")]
    RowWidthMismatch {
        row_idx: usize,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate column names detected: {0}")]
    DuplicateColumns(String),

    #[error("Column not found: {0:?}")]
    ColumnNotFound(String),

    #[error("Column index {col_idx} out of range for {width} columns")]
    ColumnIndexOutOfRange { col_idx: usize, width: usize },

    #[error("Merge key {0:?} is not a fixed column")]
    MergeKeyNotFixed(String),

    #[error("At least one merge key column is required")]
    EmptyMergeKeys,

    #[error(
        "Merge range overlap in column {col_name:?}: rows {row_start}..={row_end} start before row {row_prev_end} ends"
    )]
    MergeRangeOverlap {
        col_name: String,
        row_start: usize,
        row_end: usize,
        row_prev_end: usize,
    },

    #[error("Merge range in column {col_name:?} spans a single row ({row_start}..={row_end})")]
    MergeRangeTooShort {
        col_name: String,
        row_start: usize,
        row_end: usize,
    },

    #[error("Merge range in column {col_name:?} ends at row {row_end}; table has {n_rows} rows")]
    MergeRangeOutOfBounds {
        col_name: String,
        row_end: usize,
        n_rows: usize,
    },

    #[error("Cannot write after close()")]
    WriterClosed,

    #[error("Excel limit exceeded: {0}")]
    ExcelLimitExceeded(String),
}

pub type Result<T> = std::result::Result<T, XlsxExpandError>;
