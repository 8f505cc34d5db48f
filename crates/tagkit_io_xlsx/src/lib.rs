//! `tagkit_io_xlsx` v1:
//! Rust-side kernel that expands multi-line tag-list cells into one row per
//! line and re-merges the shared identifying columns.
//!
//! Module layout:
//! - `conf`     : constants and default presets
//! - `spec`     : specs/models/options
//! - `error`    : kernel error type
//! - `util`     : pure helper functions
//! - `expand`   : row expansion
//! - `merge`    : vertical group merge planning
//! - `reader`   : calamine workbook loader
//! - `writer`   : rust_xlsxwriter workbook writer
//! - `frame`    : polars DataFrame interchange
//! - `pipeline` : load -> expand -> merge -> write driver
pub mod conf;
pub mod error;
pub mod expand;
pub mod frame;
pub mod merge;
pub mod pipeline;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_SHEET_NAME_DEFAULT, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_COLS_FIXED_DEFAULT,
    TUP_COLS_MERGE_KEY_DEFAULT, derive_default_expand_job,
};
pub use error::XlsxExpandError;
pub use expand::{expand_table, expand_table_by_name};
pub use merge::{
    compute_merge_ranges, compute_merge_ranges_by_name, validate_merge_keys,
    validate_merge_ranges,
};
pub use pipeline::{SpecExpandPlan, plan_expand_merge, run_expand_job};
pub use reader::{load_sheet_table, load_workbook_snapshot};
pub use spec::{
    EnumCellValue, SpecCellFormat, SpecColumnPartition, SpecExpandJob, SpecMergeRange,
    SpecSheetGrid, SpecTable, SpecWorkbookSnapshot, SpecXlsxReport, SpecXlsxWriteOptions,
};
pub use util::split_cell_lines;
pub use writer::XlsxWriter;
