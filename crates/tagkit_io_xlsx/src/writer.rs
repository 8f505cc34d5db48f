//! XLSX writer kernel: rebuilds the workbook with the expanded sheet and its merges.

use std::collections::BTreeSet;
use std::path::PathBuf;

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::error::{Result, XlsxExpandError};
use crate::merge::validate_merge_ranges;
use crate::spec::{
    EnumCellValue, SpecCellFormat, SpecMergeRange, SpecSheetGrid, SpecTable,
    SpecWorkbookSnapshot, SpecXlsxReport, SpecXlsxWriteOptions,
};
use crate::util::{cast_col_num, cast_row_num};

/// Number of header rows above the data rows of a written table.
const N_ROWS_HEADER: usize = 1;

/// Stateful workbook writer.
///
/// The workbook is buffered in memory until [`Self::close`] is called, so a
/// failure before `close` leaves the destination file untouched.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    fmt_text: SpecCellFormat,
    fmt_merge: SpecCellFormat,
    write_options: SpecXlsxWriteOptions,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path and format/options presets.
    pub fn new(
        path_file_out: PathBuf,
        fmt_text: SpecCellFormat,
        fmt_merge: SpecCellFormat,
        write_options: SpecXlsxWriteOptions,
    ) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            fmt_text,
            fmt_merge,
            write_options,
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook.save(&self.path_file_out)?;
        self.if_closed = true;
        log::info!("saved workbook {}", self.path_file_out.display());
        Ok(())
    }

    /// Rebuild every sheet of `snapshot` in workbook order, replacing the
    /// target sheet with `table` and its planned merges.
    pub fn write_snapshot(
        &mut self,
        snapshot: &SpecWorkbookSnapshot,
        table: &SpecTable,
        merges: &[SpecMergeRange],
        report: &mut SpecXlsxReport,
    ) -> Result<()> {
        for sheet_name in &snapshot.sheet_names {
            if *sheet_name == snapshot.sheet_name_target {
                self.write_table_sheet(sheet_name, table, merges)?;
                continue;
            }
            if !self.write_options.if_keep_sibling_sheets {
                report.warn(format!("Sibling sheet {sheet_name:?} dropped."));
                continue;
            }
            if let Some(grid) = snapshot
                .sheets_sibling
                .iter()
                .find(|grid| grid.sheet_name == *sheet_name)
            {
                self.write_grid_sheet(grid)?;
                report.warn(format!(
                    "Sibling sheet {sheet_name:?} rewritten with values only."
                ));
            }
        }
        Ok(())
    }

    /// Write one table: header in the first row, data below, then vertical merges.
    ///
    /// Cells covered by a merge keep their own value underneath the union,
    /// so undoing the merge in Excel reveals every row's value.
    pub fn write_table_sheet(
        &mut self,
        sheet_name: &str,
        table: &SpecTable,
        merges: &[SpecMergeRange],
    ) -> Result<()> {
        if self.if_closed {
            return Err(XlsxExpandError::WriterClosed);
        }
        validate_table_extent(table)?;
        validate_merge_ranges(merges)?;
        validate_merge_bounds(table, merges)?;

        let fmt_text = derive_rust_xlsx_format(&self.fmt_text);
        let fmt_merge = derive_rust_xlsx_format(&self.fmt_text.merge(&self.fmt_merge));
        let set_cells_merged = derive_vertical_merge_tracker(merges);
        let if_keep_numeric = self.write_options.if_keep_numeric_cells;

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(sheet_name)?;

        for (col_idx, c_name) in table.columns().iter().enumerate() {
            worksheet.write_string_with_format(0, cast_col_num(col_idx)?, c_name, &fmt_text)?;
        }

        for merge in merges {
            worksheet.merge_range(
                cast_row_num(N_ROWS_HEADER + merge.row_start)?,
                cast_col_num(merge.col_idx)?,
                cast_row_num(N_ROWS_HEADER + merge.row_end)?,
                cast_col_num(merge.col_idx)?,
                table.text(merge.row_start, merge.col_idx),
                &fmt_merge,
            )?;
        }

        for (row_idx, row) in table.rows().iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                let if_merged = set_cells_merged.contains(&(row_idx, col_idx));
                write_cell_with_format(
                    worksheet,
                    N_ROWS_HEADER + row_idx,
                    col_idx,
                    value,
                    if_keep_numeric,
                    if if_merged { &fmt_merge } else { &fmt_text },
                )?;
            }
        }

        log::debug!(
            "wrote sheet {sheet_name:?}: {} rows, {} merges",
            table.height(),
            merges.len()
        );
        Ok(())
    }

    /// Write a value grid at the position it was read from.
    pub fn write_grid_sheet(&mut self, grid: &SpecSheetGrid) -> Result<()> {
        if self.if_closed {
            return Err(XlsxExpandError::WriterClosed);
        }
        let fmt_text = derive_rust_xlsx_format(&self.fmt_text);
        let if_keep_numeric = self.write_options.if_keep_numeric_cells;
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&grid.sheet_name)?;

        let (row_origin, col_origin) = grid.origin;
        for (row_idx, row) in grid.rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                write_cell_with_format(
                    worksheet,
                    row_origin + row_idx,
                    col_origin + col_idx,
                    value,
                    if_keep_numeric,
                    &fmt_text,
                )?;
            }
        }
        Ok(())
    }
}

fn validate_table_extent(table: &SpecTable) -> Result<()> {
    if table.height() + N_ROWS_HEADER > N_NROWS_EXCEL_MAX {
        return Err(XlsxExpandError::ExcelLimitExceeded(format!(
            "{} expanded rows plus header exceed {N_NROWS_EXCEL_MAX} rows",
            table.height()
        )));
    }
    if table.width() > N_NCOLS_EXCEL_MAX {
        return Err(XlsxExpandError::ExcelLimitExceeded(format!(
            "{} columns exceed {N_NCOLS_EXCEL_MAX} columns",
            table.width()
        )));
    }
    Ok(())
}

fn validate_merge_bounds(table: &SpecTable, merges: &[SpecMergeRange]) -> Result<()> {
    for merge in merges {
        table.validate_column_indices(&[merge.col_idx])?;
        if merge.row_end >= table.height() {
            return Err(XlsxExpandError::MergeRangeOutOfBounds {
                col_name: merge.col_name.clone(),
                row_end: merge.row_end,
                n_rows: table.height(),
            });
        }
    }
    Ok(())
}

/// Set of `(data_row, col)` cells covered by any merge.
pub fn derive_vertical_merge_tracker(merges: &[SpecMergeRange]) -> BTreeSet<(usize, usize)> {
    merges
        .iter()
        .flat_map(|merge| (merge.row_start..=merge.row_end).map(|row_idx| (row_idx, merge.col_idx)))
        .collect()
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    if_keep_numeric: bool,
    format: &Format,
) -> Result<()> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    let c_text = value.as_str();

    if c_text.is_empty() {
        worksheet.write_blank(n_row, n_col, format)?;
        return Ok(());
    }
    if if_keep_numeric && let Some(n_value) = value.as_number() {
        worksheet.write_number_with_format(n_row, n_col, n_value, format)?;
        return Ok(());
    }
    worksheet.write_string_with_format(n_row, n_col, c_text, format)?;
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();
    for val in [&spec.align, &spec.valign].into_iter().flatten() {
        if let Some(align) = derive_format_align(val) {
            format = format.set_align(align);
        }
    }
    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}
