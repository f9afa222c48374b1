#[macro_use] extern crate log;
extern crate httpcheck;

use std::process::ExitCode;

use clap::Parser;
use httpcheck::config::RunnerConfig;

fn main() -> ExitCode {
    env_logger::init();
    let config = RunnerConfig::parse();

    let stdout = std::io::stdout();
    match httpcheck::runner::run(&config, &mut stdout.lock()) {
        Ok(summary) if summary.success() => ExitCode::SUCCESS,
        Ok(summary) => {
            debug!("{} passed, {} failed", summary.passed, summary.failed);
            ExitCode::from(1)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(1)
        }
    }
}
