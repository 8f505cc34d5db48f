//! Workbook loader: reads the target sheet as a table and siblings as value grids.

use std::path::Path;

use calamine::{Data, Range, Reader, Xlsx, open_workbook};

use crate::error::{Result, XlsxExpandError};
use crate::spec::{EnumCellValue, SpecSheetGrid, SpecTable, SpecWorkbookSnapshot, SpecXlsxReport};
use crate::util::{derive_text_from_number, derive_unnamed_column_name};

/// Load every sheet of `path`, parsing `sheet_name` into a table.
///
/// The first row of the sheet's used range is the header. Empty cells load
/// as [`EnumCellValue::Missing`]; text is kept verbatim (a literal `NA` or a
/// text-stored `1001` stays text), numbers load as
/// [`EnumCellValue::Numeric`] and every other cell type is coerced to text.
/// Duplicate header names are rejected.
pub fn load_workbook_snapshot(
    path: &Path,
    sheet_name: &str,
    report: &mut SpecXlsxReport,
) -> Result<SpecWorkbookSnapshot> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names = workbook.sheet_names().to_vec();

    if !sheet_names.iter().any(|name| name == sheet_name) {
        return Err(XlsxExpandError::SheetNotFound {
            path: path.to_path_buf(),
            sheet_name: sheet_name.to_string(),
        });
    }

    let mut table = None;
    let mut sheets_sibling = Vec::new();
    for name in &sheet_names {
        let range = workbook.worksheet_range(name)?;
        if name == sheet_name {
            table = Some(derive_table_from_range(&range, sheet_name, report)?);
        } else {
            sheets_sibling.push(derive_grid_from_range(&range, name));
        }
    }

    let table = table.ok_or_else(|| XlsxExpandError::EmptySheet(sheet_name.to_string()))?;
    log::debug!(
        "loaded sheet {sheet_name:?} from {}: {} columns, {} rows, {} sibling sheets",
        path.display(),
        table.width(),
        table.height(),
        sheets_sibling.len()
    );

    Ok(SpecWorkbookSnapshot {
        sheet_names,
        sheet_name_target: sheet_name.to_string(),
        table,
        sheets_sibling,
    })
}

/// Load only `sheet_name` of `path` as a table.
pub fn load_sheet_table(path: &Path, sheet_name: &str) -> Result<SpecTable> {
    let mut report = SpecXlsxReport::default();
    Ok(load_workbook_snapshot(path, sheet_name, &mut report)?.table)
}

/// Build a table from a sheet range; first row is the header.
pub fn derive_table_from_range(
    range: &Range<Data>,
    sheet_name: &str,
    report: &mut SpecXlsxReport,
) -> Result<SpecTable> {
    let mut it_rows = range.rows();
    let Some(v_header) = it_rows.next() else {
        return Err(XlsxExpandError::EmptySheet(sheet_name.to_string()));
    };

    if let Some((row, col)) = range.start()
        && (row, col) != (0, 0)
    {
        report.warn(format!(
            "Sheet {sheet_name:?} starts at row {}, column {}; output is written from A1.",
            row + 1,
            col + 1
        ));
    }

    let mut l_rows: Vec<Vec<EnumCellValue>> = it_rows
        .map(|row| row.iter().map(derive_cell_value_from_data).collect())
        .collect();
    while l_rows
        .last()
        .is_some_and(|row| row.iter().all(EnumCellValue::is_empty))
    {
        l_rows.pop();
    }

    let mut l_columns: Vec<Option<String>> = v_header
        .iter()
        .map(|cell| {
            let value = derive_cell_value_from_data(cell);
            (!value.is_empty()).then(|| value.as_str().to_string())
        })
        .collect();

    // Trailing columns with neither a header nor any value are layout residue.
    while l_columns.last().is_some_and(Option::is_none) {
        let n_idx_col = l_columns.len() - 1;
        if l_rows.iter().any(|row| !row[n_idx_col].is_empty()) {
            break;
        }
        l_columns.pop();
        for row in &mut l_rows {
            row.truncate(n_idx_col);
        }
    }

    let columns: Vec<String> = l_columns
        .into_iter()
        .enumerate()
        .map(|(n_idx_col, c_name)| {
            c_name.unwrap_or_else(|| {
                let c_placeholder = derive_unnamed_column_name(n_idx_col);
                report.warn(format!(
                    "Blank header in column {}; named {c_placeholder:?}.",
                    n_idx_col + 1
                ));
                c_placeholder
            })
        })
        .collect();

    SpecTable::new(columns, l_rows)
}

fn derive_grid_from_range(range: &Range<Data>, sheet_name: &str) -> SpecSheetGrid {
    let origin = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));
    SpecSheetGrid {
        sheet_name: sheet_name.to_string(),
        origin,
        rows: range
            .rows()
            .map(|row| row.iter().map(derive_cell_value_from_data).collect())
            .collect(),
    }
}

/// Coerce one calamine cell into the text-or-missing model.
pub fn derive_cell_value_from_data(value: &Data) -> EnumCellValue {
    match value {
        Data::Empty => EnumCellValue::Missing,
        Data::String(val) => EnumCellValue::Text(val.clone()),
        Data::Float(val) => EnumCellValue::from(*val),
        Data::Int(val) => EnumCellValue::Numeric(val.to_string()),
        Data::Bool(val) => EnumCellValue::Text(if *val { "True" } else { "False" }.to_string()),
        Data::DateTime(val) => EnumCellValue::Text(
            val.as_datetime()
                .map(|dt| dt.to_string())
                .unwrap_or_else(|| derive_text_from_number(val.as_f64())),
        ),
        Data::DateTimeIso(val) => EnumCellValue::Text(val.clone()),
        Data::DurationIso(val) => EnumCellValue::Text(val.clone()),
        Data::Error(val) => EnumCellValue::Text(val.to_string()),
    }
}
