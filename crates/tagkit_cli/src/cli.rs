use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use tagkit_io_xlsx::{SpecExpandJob, SpecXlsxReport, run_expand_job};

use crate::config::{ConfigLayer, load_config_file};

/// Command-line arguments of the `tagkit` binary.
#[derive(Debug, Parser)]
#[command(
    name = "tagkit",
    about = "Expand multi-line tag cells into one row per line and merge shared P&ID/line cells."
)]
pub struct Args {
    /// Workbook to expand (overwritten in place unless `--output` is given).
    file: Option<PathBuf>,

    /// TOML config file; flags given here override it.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Sheet to operate on.
    #[arg(long = "sheet")]
    sheet_name: Option<String>,

    /// Fixed column names, in order (repeatable or comma-separated).
    #[arg(long = "fixed", value_delimiter = ',')]
    cols_fixed: Vec<String>,

    /// Merge-key column names, in order (repeatable or comma-separated).
    ///
    /// Every merge key must also be a fixed column.
    #[arg(long = "merge-key", value_delimiter = ',')]
    cols_merge_key: Vec<String>,

    /// Write the result here instead of overwriting the input.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    file_out: Option<PathBuf>,

    /// Copy the input to `<stem>.bak.<ext>` before overwriting it.
    #[arg(long)]
    backup: bool,

    /// More log output (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    /// Log level implied by `-v` / `-q`. `RUST_LOG` still wins when set.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }

    fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            file: self.file.clone(),
            file_out: self.file_out.clone(),
            sheet_name: self.sheet_name.clone(),
            cols_fixed: non_empty(&self.cols_fixed),
            cols_merge_key: non_empty(&self.cols_merge_key),
            backup: self.backup.then_some(true),
            ..Default::default()
        }
    }

    /// Resolve defaults, the config file and flags into one job.
    pub fn resolve_job(&self) -> Result<SpecExpandJob> {
        let layer_file = match &self.config {
            Some(path) => load_config_file(path)?,
            None => ConfigLayer::default(),
        };
        layer_file.overlay(self.to_layer()).into_expand_job()
    }
}

fn non_empty(l_names: &[String]) -> Option<Vec<String>> {
    (!l_names.is_empty()).then(|| l_names.to_vec())
}

/// Install the `env_logger` backend at `level`.
pub fn init_logger(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .init();
}

/// Resolve the job and run it.
pub fn run(args: &Args) -> Result<SpecXlsxReport> {
    let job = args.resolve_job()?;
    run_expand_job(&job).with_context(|| {
        format!(
            "failed to expand sheet {:?} of {}",
            job.sheet_name,
            job.file_in.display()
        )
    })
}
