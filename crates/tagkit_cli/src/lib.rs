//! `tagkit_cli`: command-line front end for `tagkit_io_xlsx`.
//!
//! Module layout:
//! - `config` : TOML config layer and default filling
//! - `cli`    : clap arguments, logger setup, job runner
pub mod cli;
pub mod config;

pub use cli::{Args, init_logger, run};
pub use config::{ConfigLayer, load_config_file};
