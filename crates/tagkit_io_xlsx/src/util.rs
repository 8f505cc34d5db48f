//! Stateless helper utilities shared by the expand, merge and IO modules.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{C_COLNAME_UNNAMED_PREFIX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::error::{Result, XlsxExpandError};

////////////////////////////////////////////////////////////////////////////////
// #region LineSplitting

/// Split a multi-line cell into trimmed, non-empty lines.
///
/// Blank cells and cells holding only whitespace/newlines yield `[""]`, never
/// an empty vector.
pub fn split_cell_lines(text: &str) -> Vec<String> {
    let l_lines: Vec<String> = text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect();

    if l_lines.is_empty() {
        vec![String::new()]
    } else {
        l_lines
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnResolution

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<()> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter(|(_, l_pos)| l_pos.len() > 1)
        .map(|(c_name, l_pos)| format!("{c_name:?} x{} at indices {:?}", l_pos.len(), l_pos))
        .collect::<Vec<_>>()
        .join("; ");

    Err(XlsxExpandError::DuplicateColumns(c_msg))
}

/// Resolve column names to sorted unique indices.
pub fn select_indices_from_names(columns: &[String], names: &[String]) -> Result<Vec<usize>> {
    let mut set_idx = BTreeSet::new();
    for c_name in names {
        set_idx.insert(find_column_index(columns, c_name)?);
    }
    Ok(set_idx.into_iter().collect())
}

/// Resolve column names to indices, keeping the order of `names`.
pub fn resolve_ordered_indices(columns: &[String], names: &[String]) -> Result<Vec<usize>> {
    names
        .iter()
        .map(|c_name| find_column_index(columns, c_name))
        .collect()
}

fn find_column_index(columns: &[String], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c_name| c_name == name)
        .ok_or_else(|| XlsxExpandError::ColumnNotFound(name.to_string()))
}

/// Placeholder name for a header cell left blank in the source.
pub fn derive_unnamed_column_name(col_idx: usize) -> String {
    format!("{C_COLNAME_UNNAMED_PREFIX}{col_idx}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region NumericText

/// Render a float as cell text; integral values drop the fractional part.
///
/// The text parses back to the same `f64`.
pub fn derive_text_from_number(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        x.to_string()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExcelCoordinates

pub(crate) fn cast_row_num(value: usize) -> Result<u32> {
    if value >= N_NROWS_EXCEL_MAX {
        return Err(XlsxExpandError::ExcelLimitExceeded(format!(
            "row index {value} exceeds {N_NROWS_EXCEL_MAX} rows"
        )));
    }
    u32::try_from(value)
        .map_err(|_| XlsxExpandError::ExcelLimitExceeded(format!("row index overflow: {value}")))
}

pub(crate) fn cast_col_num(value: usize) -> Result<u16> {
    if value >= N_NCOLS_EXCEL_MAX {
        return Err(XlsxExpandError::ExcelLimitExceeded(format!(
            "column index {value} exceeds {N_NCOLS_EXCEL_MAX} columns"
        )));
    }
    u16::try_from(value).map_err(|_| {
        XlsxExpandError::ExcelLimitExceeded(format!("column index overflow: {value}"))
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
