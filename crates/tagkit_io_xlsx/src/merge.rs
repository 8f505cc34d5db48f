//! Vertical group merge planning over an expanded table.
//!
//! Rows are grouped by the full merge-key tuple: a change in any key column
//! closes the current group for all key columns at once, so merged cells
//! across key columns always line up.

use std::collections::BTreeMap;

use crate::error::{Result, XlsxExpandError};
use crate::spec::{SpecMergeRange, SpecTable};
use crate::util::resolve_ordered_indices;

/// Running state of the key-tuple scan.
struct GroupScan<'a> {
    table: &'a SpecTable,
    cols_idx_key: &'a [usize],
    row_idx_start: usize,
    l_ranges: Vec<SpecMergeRange>,
}

impl<'a> GroupScan<'a> {
    fn new(table: &'a SpecTable, cols_idx_key: &'a [usize]) -> Self {
        Self {
            table,
            cols_idx_key,
            row_idx_start: 0,
            l_ranges: Vec::new(),
        }
    }

    fn key(&self, row_idx: usize) -> Vec<&'a str> {
        self.cols_idx_key
            .iter()
            .map(|&col_idx| self.table.text(row_idx, col_idx))
            .collect()
    }

    /// Close the open group at `row_idx_end` (inclusive), emitting one range
    /// per key column when the group spans more than one row.
    fn close_group(&mut self, row_idx_end: usize) {
        if row_idx_end > self.row_idx_start {
            for &col_idx in self.cols_idx_key {
                self.l_ranges.push(SpecMergeRange {
                    col_idx,
                    col_name: self.table.columns()[col_idx].clone(),
                    row_start: self.row_idx_start,
                    row_end: row_idx_end,
                });
            }
        }
    }

    fn run(mut self) -> Vec<SpecMergeRange> {
        let n_rows = self.table.height();
        if n_rows == 0 {
            return self.l_ranges;
        }

        let mut v_key_prev = self.key(0);
        for row_idx in 1..n_rows {
            let v_key_cur = self.key(row_idx);
            if v_key_cur != v_key_prev {
                self.close_group(row_idx - 1);
                self.row_idx_start = row_idx;
                v_key_prev = v_key_cur;
            }
        }
        self.close_group(n_rows - 1);

        self.l_ranges
    }
}

/// Plan vertical merges for runs of identical key tuples.
///
/// Ranges are ordered by group, then by key column in the order given.
/// An index outside `table` fails with
/// [`XlsxExpandError::ColumnIndexOutOfRange`].
pub fn compute_merge_ranges(
    table: &SpecTable,
    cols_idx_key: &[usize],
) -> Result<Vec<SpecMergeRange>> {
    table.validate_column_indices(cols_idx_key)?;
    if cols_idx_key.is_empty() {
        return Ok(vec![]);
    }
    let l_ranges = GroupScan::new(table, cols_idx_key).run();
    log::debug!(
        "planned {} merge ranges over {} rows",
        l_ranges.len(),
        table.height()
    );
    Ok(l_ranges)
}

/// Name-based wrapper around [`compute_merge_ranges`].
pub fn compute_merge_ranges_by_name(
    table: &SpecTable,
    cols_merge_key: &[String],
) -> Result<Vec<SpecMergeRange>> {
    if cols_merge_key.is_empty() {
        return Err(XlsxExpandError::EmptyMergeKeys);
    }
    let cols_idx_key = resolve_ordered_indices(table.columns(), cols_merge_key)?;
    compute_merge_ranges(table, &cols_idx_key)
}

/// Check merge keys are configured and all of them are fixed columns.
pub fn validate_merge_keys(cols_fixed: &[String], cols_merge_key: &[String]) -> Result<()> {
    if cols_merge_key.is_empty() {
        return Err(XlsxExpandError::EmptyMergeKeys);
    }
    for c_key in cols_merge_key {
        if !cols_fixed.contains(c_key) {
            return Err(XlsxExpandError::MergeKeyNotFixed(c_key.clone()));
        }
    }
    Ok(())
}

/// Reject ranges that span one row or overlap within a column.
///
/// Ranges from [`compute_merge_ranges`] always pass; a failure here means the
/// key comparison is broken and must surface as an error.
pub fn validate_merge_ranges(ranges: &[SpecMergeRange]) -> Result<()> {
    let mut dict_row_end_by_col: BTreeMap<usize, usize> = BTreeMap::new();
    for merge in ranges {
        if merge.row_end <= merge.row_start {
            return Err(XlsxExpandError::MergeRangeTooShort {
                col_name: merge.col_name.clone(),
                row_start: merge.row_start,
                row_end: merge.row_end,
            });
        }
        if let Some(&row_prev_end) = dict_row_end_by_col.get(&merge.col_idx)
            && merge.row_start <= row_prev_end
        {
            return Err(XlsxExpandError::MergeRangeOverlap {
                col_name: merge.col_name.clone(),
                row_start: merge.row_start,
                row_end: merge.row_end,
                row_prev_end,
            });
        }
        dict_row_end_by_col.insert(merge.col_idx, merge.row_end);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(l: &[&str]) -> Vec<String> {
        l.iter().map(|c| c.to_string()).collect()
    }

    fn spans(ranges: &[SpecMergeRange]) -> Vec<(&str, usize, usize)> {
        ranges
            .iter()
            .map(|r| (r.col_name.as_str(), r.row_start, r.row_end))
            .collect()
    }

    #[test]
    fn test_merge_worked_example() {
        let table = SpecTable::from_text_rows(
            &["SR", "PID", "LINE", "TAG", "DESC"],
            &[
                &["1", "A", "L1", "T1", "D1"],
                &["1", "A", "L1", "T2", ""],
                &["2", "A", "L1", "T3", "D2"],
            ],
        )
        .unwrap();

        let ranges = compute_merge_ranges_by_name(&table, &keys(&["PID", "LINE"])).unwrap();
        assert_eq!(spans(&ranges), vec![("PID", 0, 2), ("LINE", 0, 2)]);
    }

    #[test]
    fn test_merge_change_in_either_key_splits_both_columns() {
        let table = SpecTable::from_text_rows(
            &["PID", "LINE"],
            &[
                &["A", "L1"],
                &["A", "L1"],
                &["A", "L2"],
                &["A", "L2"],
                &["B", "L2"],
            ],
        )
        .unwrap();

        let ranges = compute_merge_ranges_by_name(&table, &keys(&["PID", "LINE"])).unwrap();
        assert_eq!(
            spans(&ranges),
            vec![
                ("PID", 0, 1),
                ("LINE", 0, 1),
                ("PID", 2, 3),
                ("LINE", 2, 3),
            ]
        );
    }

    #[test]
    fn test_merge_skips_single_row_groups_and_flushes_last_group() {
        let table = SpecTable::from_text_rows(
            &["K"],
            &[&["a"], &["b"], &["b"], &["c"], &["d"], &["d"], &["d"]],
        )
        .unwrap();

        let ranges = compute_merge_ranges(&table, &[0]).unwrap();
        assert_eq!(spans(&ranges), vec![("K", 1, 2), ("K", 4, 6)]);
    }

    #[test]
    fn test_merge_missing_and_empty_keys_compare_equal() {
        let table = SpecTable::new(
            vec!["K".into()],
            vec![
                vec![crate::spec::EnumCellValue::Missing],
                vec![crate::spec::EnumCellValue::from("")],
            ],
        )
        .unwrap();
        assert_eq!(spans(&compute_merge_ranges(&table, &[0]).unwrap()), vec![("K", 0, 1)]);
    }

    #[test]
    fn test_merge_is_exact_string_comparison() {
        let table =
            SpecTable::from_text_rows(&["K"], &[&["a"], &["A"], &["a "], &["a"]]).unwrap();
        assert!(compute_merge_ranges(&table, &[0]).unwrap().is_empty());
    }

    #[test]
    fn test_merge_empty_and_single_row_tables() {
        let empty = SpecTable::from_text_rows(&["K"], &[]).unwrap();
        assert!(compute_merge_ranges(&empty, &[0]).unwrap().is_empty());

        let single = SpecTable::from_text_rows(&["K"], &[&["a"]]).unwrap();
        assert!(compute_merge_ranges(&single, &[0]).unwrap().is_empty());
    }

    #[test]
    fn test_merge_requires_keys() {
        let table = SpecTable::from_text_rows(&["K"], &[&["a"]]).unwrap();
        assert!(matches!(
            compute_merge_ranges_by_name(&table, &[]),
            Err(XlsxExpandError::EmptyMergeKeys)
        ));
        assert!(matches!(
            compute_merge_ranges_by_name(&table, &keys(&["NOPE"])),
            Err(XlsxExpandError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_validate_merge_keys() {
        let cols_fixed = keys(&["SR", "PID", "LINE"]);
        assert!(validate_merge_keys(&cols_fixed, &keys(&["PID", "LINE"])).is_ok());
        assert!(matches!(
            validate_merge_keys(&cols_fixed, &keys(&["TAG"])),
            Err(XlsxExpandError::MergeKeyNotFixed(name)) if name == "TAG"
        ));
        assert!(matches!(
            validate_merge_keys(&cols_fixed, &[]),
            Err(XlsxExpandError::EmptyMergeKeys)
        ));
    }

    #[test]
    fn test_validate_merge_ranges_rejects_overlap_and_single_rows() {
        let range = |row_start, row_end| SpecMergeRange {
            col_idx: 1,
            col_name: "PID".to_string(),
            row_start,
            row_end,
        };

        assert!(validate_merge_ranges(&[range(0, 2), range(3, 4)]).is_ok());
        assert!(matches!(
            validate_merge_ranges(&[range(0, 2), range(2, 4)]),
            Err(XlsxExpandError::MergeRangeOverlap { row_prev_end: 2, .. })
        ));
        assert!(matches!(
            validate_merge_ranges(&[range(5, 5)]),
            Err(XlsxExpandError::MergeRangeTooShort { .. })
        ));
    }

    #[test]
    fn test_merge_is_stable_across_passes() {
        let table = SpecTable::from_text_rows(
            &["PID", "LINE", "TAG"],
            &[&["A", "L1", "t1"], &["A", "L1", "t2"], &["B", "L1", "t3"]],
        )
        .unwrap();
        let cols_key = keys(&["PID", "LINE"]);
        let first = compute_merge_ranges_by_name(&table, &cols_key).unwrap();
        let second = compute_merge_ranges_by_name(&table, &cols_key).unwrap();
        assert_eq!(first, second);
        assert!(validate_merge_ranges(&first).is_ok());
    }

    #[test]
    fn test_merge_rejects_key_index_outside_table() {
        let table = SpecTable::from_text_rows(&["K"], &[&["a"], &["a"]]).unwrap();
        assert!(matches!(
            compute_merge_ranges(&table, &[0, 3]),
            Err(XlsxExpandError::ColumnIndexOutOfRange { col_idx: 3, width: 1 })
        ));
    }

    #[test]
    fn test_merge_numeric_and_text_keys_compare_by_text() {
        let table = SpecTable::new(
            vec!["K".into()],
            vec![
                vec![crate::spec::EnumCellValue::from(1001.0)],
                vec![crate::spec::EnumCellValue::from("1001")],
            ],
        )
        .unwrap();
        assert_eq!(
            spans(&compute_merge_ranges(&table, &[0]).unwrap()),
            vec![("K", 0, 1)]
        );
    }
}
