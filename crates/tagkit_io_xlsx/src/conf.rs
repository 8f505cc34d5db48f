//! XLSX constants and default preset factories.

use crate::spec::{SpecCellFormat, SpecExpandJob, SpecXlsxWriteOptions};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;

/// Sheet operated on when none is configured.
pub const C_SHEET_NAME_DEFAULT: &str = "Sheet1";
/// Columns repeated verbatim on every derived row.
pub const TUP_COLS_FIXED_DEFAULT: [&str; 3] = ["SR. NO.", "P&ID NUMBER", "LINE NUMBER"];
/// Fixed columns whose key tuple drives vertical merges.
pub const TUP_COLS_MERGE_KEY_DEFAULT: [&str; 2] = ["P&ID NUMBER", "LINE NUMBER"];

/// Prefix used to name header cells left blank in the source sheet.
pub const C_COLNAME_UNNAMED_PREFIX: &str = "Unnamed: ";
/// Infix used when deriving the backup path (`tags.xlsx` -> `tags.bak.xlsx`).
pub const C_BACKUP_INFIX: &str = "bak";

/// Format applied to plain header and body cells.
///
/// Left empty: source formatting is not carried over.
pub fn derive_default_text_format() -> SpecCellFormat {
    SpecCellFormat::default()
}

/// Format applied to every cell covered by a vertical merge.
pub fn derive_default_merge_format() -> SpecCellFormat {
    SpecCellFormat {
        align: Some("center".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    }
}

/// Build default write options.
pub fn derive_default_xlsx_write_options() -> SpecXlsxWriteOptions {
    SpecXlsxWriteOptions::default()
}

/// Build the default job for `file_path` using the stock tag-list layout.
pub fn derive_default_expand_job(file_path: impl Into<std::path::PathBuf>) -> SpecExpandJob {
    SpecExpandJob {
        file_in: file_path.into(),
        file_out: None,
        sheet_name: C_SHEET_NAME_DEFAULT.to_string(),
        cols_fixed: TUP_COLS_FIXED_DEFAULT.iter().map(|c| c.to_string()).collect(),
        cols_merge_key: TUP_COLS_MERGE_KEY_DEFAULT
            .iter()
            .map(|c| c.to_string())
            .collect(),
        if_backup: false,
        write_options: derive_default_xlsx_write_options(),
    }
}
