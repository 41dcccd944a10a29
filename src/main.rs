use clap::Parser;
use std::process::ExitCode;

use banknote_verify::cli::{self, Cli};
use banknote_verify::logger;

fn main() -> ExitCode {
    let cli = Cli::parse();

    logger::init_cli_logger(cli.verbose);
    tracing::debug!("CLI arguments: {:?}", cli);

    match cli::run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("verification failed: {}", e);
            eprintln!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
