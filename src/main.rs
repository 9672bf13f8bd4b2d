use clap::Parser;
use dirsweep::cli::{Args, run_cli};
use dirsweep::logging::init_logging;
use dirsweep::output::OutputFormatter;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let args = Args::parse();

    let _guard = match init_logging(&args.log_file, args.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            OutputFormatter::warning(&format!("Logging disabled: {}", e));
            None
        }
    };

    match run_cli(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
