use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Runs `.http` fixture files against a live HTTP endpoint.
#[derive(Debug, Clone, Parser)]
#[command(name = "httpcheck", version)]
pub struct RunnerConfig {
    /// Directory searched recursively for fixture files.
    #[arg(short = 't', value_name = "PATH", default_value = "./data/")]
    pub tests: PathBuf,

    /// File name pattern selecting fixture files.
    #[arg(long, default_value = "*.http")]
    pub pattern: String,

    /// Base that relative fixture urls are resolved against.
    #[arg(long, value_name = "URL", default_value = "http://localhost:3000")]
    pub base_url: String,
}

/// Serves the demo `GET /hello` endpoint.
#[derive(Debug, Clone, Parser)]
#[command(name = "demo_service", version)]
pub struct DemoConfig {
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,
}
