//! Row expansion: split multi-line variable cells into one row per line.

use crate::error::Result;
use crate::spec::{EnumCellValue, SpecColumnPartition, SpecTable};
use crate::util::split_cell_lines;

/// Expand one record into `max(1, max lines over variable columns)` records.
///
/// Fixed columns are copied onto every derived record (`Missing` becomes
/// empty text, numbers stay numbers); variable columns receive their lines
/// as text, top to bottom, padded at the end with empty text.
///
/// Partition indices must address `record`.
pub(crate) fn expand_record(
    record: &[EnumCellValue],
    partition: &SpecColumnPartition,
) -> Vec<Vec<EnumCellValue>> {
    let l_lines_by_col: Vec<(usize, Vec<String>)> = partition
        .cols_idx_variable
        .iter()
        .map(|&col_idx| (col_idx, split_cell_lines(record[col_idx].as_str())))
        .collect();

    let n_width = l_lines_by_col
        .iter()
        .map(|(_, l_lines)| l_lines.len())
        .max()
        .unwrap_or(1)
        .max(1);

    let mut l_records = Vec::with_capacity(n_width);
    for n_idx_line in 0..n_width {
        let mut v_record = vec![EnumCellValue::Text(String::new()); record.len()];
        for &col_idx in &partition.cols_idx_fixed {
            v_record[col_idx] = record[col_idx].clone().into_text();
        }
        for (col_idx, l_lines) in &l_lines_by_col {
            if let Some(line) = l_lines.get(n_idx_line) {
                v_record[*col_idx] = EnumCellValue::Text(line.clone());
            }
        }
        l_records.push(v_record);
    }
    l_records
}

/// Expand every record of `table`; column order is unchanged.
pub fn expand_table(table: &SpecTable, partition: &SpecColumnPartition) -> Result<SpecTable> {
    table.validate_column_indices(&partition.cols_idx_fixed)?;
    table.validate_column_indices(&partition.cols_idx_variable)?;

    let mut l_rows = Vec::with_capacity(table.height());
    for record in table.rows() {
        l_rows.extend(expand_record(record, partition));
    }

    log::debug!(
        "expanded {} rows into {} rows ({} fixed, {} variable columns)",
        table.height(),
        l_rows.len(),
        partition.cols_idx_fixed.len(),
        partition.cols_idx_variable.len()
    );

    SpecTable::new(table.columns().to_vec(), l_rows)
}

/// Expand `table` using fixed-column names; every other column is variable.
pub fn expand_table_by_name(table: &SpecTable, cols_fixed: &[String]) -> Result<SpecTable> {
    let partition = SpecColumnPartition::from_fixed_names(table.columns(), cols_fixed)?;
    expand_table(table, &partition)
}
