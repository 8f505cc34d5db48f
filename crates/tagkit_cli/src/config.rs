//! Layered job configuration: built-in defaults, then a TOML file, then flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tagkit_io_xlsx::{SpecExpandJob, derive_default_expand_job};

/// One configuration source. Every field is optional; unset fields fall
/// through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    /// Workbook to expand.
    pub file: Option<PathBuf>,
    /// Output path; defaults to overwriting `file`.
    pub file_out: Option<PathBuf>,
    pub sheet_name: Option<String>,
    /// Columns repeated on every derived row.
    pub cols_fixed: Option<Vec<String>>,
    /// Fixed columns whose key tuple drives vertical merges.
    pub cols_merge_key: Option<Vec<String>>,
    /// Copy the input aside before overwriting it.
    pub backup: Option<bool>,
    /// Write numeric source cells back as numbers.
    pub keep_numeric_cells: Option<bool>,
    pub keep_sibling_sheets: Option<bool>,
}

impl ConfigLayer {
    /// Stack `upper` on top of `self`; set fields in `upper` win.
    pub fn overlay(self, upper: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            file: upper.file.or(self.file),
            file_out: upper.file_out.or(self.file_out),
            sheet_name: upper.sheet_name.or(self.sheet_name),
            cols_fixed: upper.cols_fixed.or(self.cols_fixed),
            cols_merge_key: upper.cols_merge_key.or(self.cols_merge_key),
            backup: upper.backup.or(self.backup),
            keep_numeric_cells: upper.keep_numeric_cells.or(self.keep_numeric_cells),
            keep_sibling_sheets: upper.keep_sibling_sheets.or(self.keep_sibling_sheets),
        }
    }

    /// Fill unset fields from the stock defaults and build the job.
    pub fn into_expand_job(self) -> Result<SpecExpandJob> {
        let Some(file) = self.file else {
            bail!("no input workbook given; pass FILE or set `file` in the config file");
        };

        let mut job = derive_default_expand_job(file);
        job.file_out = self.file_out;
        if let Some(sheet_name) = self.sheet_name {
            job.sheet_name = sheet_name;
        }
        if let Some(cols_fixed) = self.cols_fixed {
            job.cols_fixed = cols_fixed;
        }
        if let Some(cols_merge_key) = self.cols_merge_key {
            job.cols_merge_key = cols_merge_key;
        }
        if let Some(if_backup) = self.backup {
            job.if_backup = if_backup;
        }
        if let Some(if_keep) = self.keep_numeric_cells {
            job.write_options.if_keep_numeric_cells = if_keep;
        }
        if let Some(if_keep) = self.keep_sibling_sheets {
            job.write_options.if_keep_sibling_sheets = if_keep;
        }
        Ok(job)
    }
}

/// Read a TOML config file.
///
/// Relative `file` / `file_out` entries are taken relative to the config
/// file's own directory.
pub fn load_config_file(path: &Path) -> Result<ConfigLayer> {
    let c_text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let mut layer: ConfigLayer = toml::from_str(&c_text)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;

    let dir_base = path.parent().unwrap_or_else(|| Path::new(""));
    layer.file = layer.file.map(|p| resolve_relative(dir_base, p));
    layer.file_out = layer.file_out.map(|p| resolve_relative(dir_base, p));
    Ok(layer)
}

fn resolve_relative(dir_base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        dir_base.join(path)
    }
}
