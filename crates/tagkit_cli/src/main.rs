use std::process::ExitCode;

use clap::Parser;
use tagkit_cli::{Args, init_logger, run};

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.log_level());

    match run(&args) {
        Ok(report) => {
            println!("Done! Expanded sheet written → {}", report.file_out.display());
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}
