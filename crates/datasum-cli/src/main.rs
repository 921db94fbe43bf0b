use datasum_core::logging;
use std::process::ExitCode;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() -> ExitCode {
    // Log to the state dir if possible, otherwise to stderr.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    match CliCommand::run_from_args().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("datasum error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
