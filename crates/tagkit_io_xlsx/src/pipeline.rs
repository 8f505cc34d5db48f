//! End-to-end driver: load, expand, plan merges, render, persist.

use std::fs;

use crate::conf::{derive_default_merge_format, derive_default_text_format};
use crate::error::Result;
use crate::expand::expand_table;
use crate::merge::{compute_merge_ranges_by_name, validate_merge_keys, validate_merge_ranges};
use crate::reader::load_workbook_snapshot;
use crate::spec::{SpecColumnPartition, SpecExpandJob, SpecMergeRange, SpecTable, SpecXlsxReport};
use crate::writer::XlsxWriter;

/// Expanded table plus the merges to apply when rendering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExpandPlan {
    /// Partition used for the expansion.
    pub partition: SpecColumnPartition,
    /// Expanded table.
    pub table: SpecTable,
    /// Vertical merges over `table`.
    pub merges: Vec<SpecMergeRange>,
}

/// Pure in-memory half of the job: expand `table` and plan its merges.
pub fn plan_expand_merge(
    table: &SpecTable,
    cols_fixed: &[String],
    cols_merge_key: &[String],
) -> Result<SpecExpandPlan> {
    validate_merge_keys(cols_fixed, cols_merge_key)?;
    let partition = SpecColumnPartition::from_fixed_names(table.columns(), cols_fixed)?;
    let table_out = expand_table(table, &partition)?;
    let merges = compute_merge_ranges_by_name(&table_out, cols_merge_key)?;
    validate_merge_ranges(&merges)?;
    Ok(SpecExpandPlan {
        partition,
        table: table_out,
        merges,
    })
}

/// Run one job against the filesystem.
///
/// Nothing is written until the whole transform has succeeded; the output
/// file is then replaced in one save. With `if_backup`, an input that is
/// about to be overwritten is first copied to [`SpecExpandJob::path_backup`].
pub fn run_expand_job(job: &SpecExpandJob) -> Result<SpecXlsxReport> {
    let mut report = SpecXlsxReport {
        sheet_name: job.sheet_name.clone(),
        file_out: job.path_out().to_path_buf(),
        ..Default::default()
    };

    log::info!(
        "expanding sheet {:?} of {}",
        job.sheet_name,
        job.file_in.display()
    );
    let snapshot = load_workbook_snapshot(&job.file_in, &job.sheet_name, &mut report)?;
    let plan = plan_expand_merge(&snapshot.table, &job.cols_fixed, &job.cols_merge_key)?;

    if job.if_backup {
        if job.if_overwrites_input() {
            let path_backup = job.path_backup();
            fs::copy(&job.file_in, &path_backup)?;
            log::info!("backed up input to {}", path_backup.display());
        } else {
            log::debug!("output differs from input; backup skipped");
        }
    }

    let mut writer = XlsxWriter::new(
        job.path_out().to_path_buf(),
        derive_default_text_format(),
        derive_default_merge_format(),
        job.write_options.clone(),
    );
    writer.write_snapshot(
        &snapshot,
        &plan.table,
        &plan.merges,
        &mut report,
    )?;
    writer.close()?;

    report.n_rows_in = snapshot.table.height();
    report.n_rows_out = plan.table.height();
    report.merges = plan.merges;
    for c_warning in &report.warnings {
        log::warn!("{c_warning}");
    }

    Ok(report)
}
