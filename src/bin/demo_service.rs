#[macro_use] extern crate log;
extern crate httpcheck;

use std::process::ExitCode;

use clap::Parser;
use httpcheck::config::DemoConfig;
use httpcheck::demo::DemoService;

fn main() -> ExitCode {
    env_logger::init();
    let config = DemoConfig::parse();

    match httpcheck::start(config.listen, DemoService) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("demo service stopped: {}", e);
            ExitCode::from(1)
        }
    }
}
