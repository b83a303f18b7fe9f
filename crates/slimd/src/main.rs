use std::process::ExitCode;

use slim_config::ConfigError;
use slimd::LaunchError;

fn main() -> ExitCode {
    match slimd::run_slimd() {
        Ok(()) => ExitCode::SUCCESS,
        Err(LaunchError::Config {
            source: ConfigError::Cli(error),
        }) => error.exit(),
        Err(error) => {
            eprintln!("slimd: {error}");
            ExitCode::FAILURE
        }
    }
}
