use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::Workbook;
use tagkit_io_xlsx::{
    XlsxExpandError, derive_default_expand_job, load_sheet_table, run_expand_job,
};

fn write_source_workbook(path: &Path) {
    let mut workbook = Workbook::new();

    let notes = workbook.add_worksheet();
    notes.set_name("Notes").unwrap();
    notes.write_string(0, 0, "revision").unwrap();
    notes.write_number(0, 1, 3.0).unwrap();
    notes.write_string(1, 0, "12").unwrap();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1").unwrap();
    let headers = ["SR. NO.", "P&ID NUMBER", "LINE NUMBER", "TAG NO.", "SERVICE"];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    sheet.write_number(1, 0, 1.0).unwrap();
    sheet.write_string(1, 1, "VB-101").unwrap();
    sheet.write_string(1, 2, "6\"-P-1001").unwrap();
    sheet.write_string(1, 3, "PT-1001\nTT-1002\n").unwrap();
    sheet.write_string(1, 4, "Feed pressure").unwrap();

    sheet.write_number(2, 0, 2.0).unwrap();
    sheet.write_string(2, 1, "VB-101").unwrap();
    sheet.write_string(2, 2, "6\"-P-1001").unwrap();
    sheet.write_string(2, 3, "FT-1003").unwrap();
    sheet.write_string(2, 4, "Feed flow").unwrap();

    sheet.write_number(3, 0, 3.0).unwrap();
    sheet.write_string(3, 1, "VB-102").unwrap();
    sheet.write_string(3, 2, "4\"-P-2001").unwrap();
    sheet.write_string(3, 4, "Spare").unwrap();

    workbook.save(path).unwrap();
}

fn merged_regions(path: &Path, sheet_name: &str) -> Vec<((u32, u32), (u32, u32))> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    workbook.load_merged_regions().unwrap();
    let mut l_regions: Vec<_> = workbook
        .merged_regions_by_sheet(sheet_name)
        .into_iter()
        .map(|(_, _, dims)| (dims.start, dims.end))
        .collect();
    l_regions.sort();
    l_regions
}

fn texts(path: &Path, sheet_name: &str) -> Vec<Vec<String>> {
    let table = load_sheet_table(path, sheet_name).unwrap();
    let mut rows = vec![table.columns().to_vec()];
    rows.extend(
        table
            .rows()
            .iter()
            .map(|row| row.iter().map(|cell| cell.as_str().to_string()).collect()),
    );
    rows
}

#[test]
fn overwrites_input_with_expanded_rows_and_keeps_backup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tags.xlsx");
    write_source_workbook(&path);

    let mut job = derive_default_expand_job(&path);
    job.if_backup = true;
    let report = run_expand_job(&job).unwrap();

    assert_eq!(report.n_rows_in, 3);
    assert_eq!(report.n_rows_out, 4);
    let spans: Vec<_> = report
        .merges
        .iter()
        .map(|r| (r.col_name.as_str(), r.row_start, r.row_end))
        .collect();
    assert_eq!(spans, vec![("P&ID NUMBER", 0, 2), ("LINE NUMBER", 0, 2)]);

    assert_eq!(
        texts(&path, "Sheet1"),
        vec![
            vec!["SR. NO.", "P&ID NUMBER", "LINE NUMBER", "TAG NO.", "SERVICE"],
            vec!["1", "VB-101", "6\"-P-1001", "PT-1001", "Feed pressure"],
            vec!["1", "VB-101", "6\"-P-1001", "TT-1002", ""],
            vec!["2", "VB-101", "6\"-P-1001", "FT-1003", "Feed flow"],
            vec!["3", "VB-102", "4\"-P-2001", "", "Spare"],
        ]
    );

    // Header sits in row 0, so data rows 0..=2 land on sheet rows 1..=3.
    assert_eq!(
        merged_regions(&path, "Sheet1"),
        vec![((1, 1), (3, 1)), ((1, 2), (3, 2))]
    );

    let backup = dir.path().join("tags.bak.xlsx");
    assert!(backup.exists());
    assert_eq!(load_sheet_table(&backup, "Sheet1").unwrap().height(), 3);
}

#[test]
fn keeps_sibling_sheets_and_numeric_source_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path_in = dir.path().join("tags.xlsx");
    let path_out = dir.path().join("tags_expanded.xlsx");
    write_source_workbook(&path_in);

    let mut job = derive_default_expand_job(&path_in);
    job.file_out = Some(path_out.clone());
    let report = run_expand_job(&job).unwrap();
    assert_eq!(report.file_out, path_out);
    assert!(!dir.path().join("tags.bak.xlsx").exists());

    let mut workbook: Xlsx<_> = open_workbook(&path_out).unwrap();
    assert_eq!(workbook.sheet_names().to_vec(), vec!["Notes", "Sheet1"]);

    let notes = workbook.worksheet_range("Notes").unwrap();
    assert_eq!(notes.get_value((0, 0)), Some(&Data::String("revision".to_string())));
    assert_eq!(notes.get_value((0, 1)), Some(&Data::Float(3.0)));
    assert_eq!(notes.get_value((1, 0)), Some(&Data::String("12".to_string())));

    let sheet = workbook.worksheet_range("Sheet1").unwrap();
    assert_eq!(sheet.get_value((1, 0)), Some(&Data::Float(1.0)));
    assert_eq!(sheet.get_value((2, 0)), Some(&Data::Float(1.0)));
    // Merged cells keep every row's value underneath the union.
    assert_eq!(
        sheet.get_value((3, 1)),
        Some(&Data::String("VB-101".to_string()))
    );

    // Input left untouched.
    assert_eq!(load_sheet_table(&path_in, "Sheet1").unwrap().height(), 3);
}

#[test]
fn text_stored_numbers_stay_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tags.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let headers = ["SR. NO.", "P&ID NUMBER", "LINE NUMBER", "TAG NO."];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    sheet.write_number(1, 0, 1.0).unwrap();
    sheet.write_string(1, 1, "1001").unwrap();
    sheet.write_number(1, 2, 2001.0).unwrap();
    sheet.write_string(1, 3, "PT-1\nPT-2").unwrap();
    workbook.save(&path).unwrap();

    let report = run_expand_job(&derive_default_expand_job(&path)).unwrap();
    assert_eq!(report.n_rows_out, 2);

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    let sheet = workbook.worksheet_range("Sheet1").unwrap();
    for row in [1, 2] {
        assert_eq!(sheet.get_value((row, 0)), Some(&Data::Float(1.0)));
        assert_eq!(
            sheet.get_value((row, 1)),
            Some(&Data::String("1001".to_string()))
        );
        assert_eq!(sheet.get_value((row, 2)), Some(&Data::Float(2001.0)));
    }
    assert_eq!(
        merged_regions(&path, "Sheet1"),
        vec![((1, 1), (2, 1)), ((1, 2), (2, 2))]
    );
}

#[test]
fn missing_sheet_is_fatal_and_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tags.xlsx");
    write_source_workbook(&path);
    let v_bytes_before = std::fs::read(&path).unwrap();

    let mut job = derive_default_expand_job(&path);
    job.sheet_name = "Tags".to_string();
    let err = run_expand_job(&job).unwrap_err();
    assert!(matches!(err, XlsxExpandError::SheetNotFound { .. }));
    assert_eq!(std::fs::read(&path).unwrap(), v_bytes_before);
}

#[test]
fn unknown_fixed_column_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tags.xlsx");
    write_source_workbook(&path);

    let mut job = derive_default_expand_job(&path);
    job.cols_fixed.push("AREA".to_string());
    let err = run_expand_job(&job).unwrap_err();
    assert!(matches!(err, XlsxExpandError::ColumnNotFound(name) if name == "AREA"));
}
