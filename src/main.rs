//! This file defines the salary-dashboard binary entry point.

use std::process::ExitCode;

use salary_dashboard::app;
use salary_dashboard::cli;
use salary_dashboard::tracing;

/// Application entry point
fn main() -> ExitCode {
    let args = cli::parse();
    tracing::init_tracing();
    match app::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error.log();
            ExitCode::FAILURE
        }
    }
}
