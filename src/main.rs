mod api;
mod app;
mod application;
mod config;
mod domain;
mod logging;
mod ui;
mod utils;

use std::io::{stdin, BufReader};
use std::process::ExitCode;

use clap::Parser;

use crate::app::DownloadApp;
use crate::config::Cli;
use crate::domain::AppError;

const INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = logging::init_logging() {
        eprintln!("failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();
    let query = cli.search_query();
    let app = DownloadApp::new(cli.to_config());

    let outcome = tokio::select! {
        outcome = app.run(&query, BufReader::new(stdin())) => outcome.map(|_| ()),
        Ok(()) = tokio::signal::ctrl_c() => Err(AppError::Cancelled),
    };

    let code = exit_code(&outcome);
    match outcome {
        Ok(()) => {}
        Err(AppError::Cancelled) => {
            // Leave immediately: a pending stdin read would otherwise hold up runtime shutdown.
            println!();
            std::process::exit(code.into());
        }
        Err(e) => {
            tracing::debug!(error = ?e, "exiting with failure");
            ui::print_error(&e.to_string());
        }
    }
    ExitCode::from(code)
}

/// Process exit status for a finished run.
fn exit_code(outcome: &Result<(), AppError>) -> u8 {
    match outcome {
        Ok(()) => 0,
        Err(AppError::Cancelled) => INTERRUPTED,
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&Ok(())), 0);
        assert_eq!(exit_code(&Err(AppError::Cancelled)), 130);
        assert_eq!(
            exit_code(&Err(AppError::Search(ApiError::UnexpectedStatus(404)))),
            1
        );
        let overflow = "99999999999999999999999".parse::<usize>().unwrap_err();
        assert_eq!(exit_code(&Err(AppError::InvalidSelection(overflow))), 1);
    }
}
