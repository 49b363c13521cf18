mod app;
mod auth;
mod cargo;
mod cli;
mod config;
mod consts;
mod error;
mod notify;
mod output;
mod qr;
mod storage;
mod utils;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::Config;
use consts::LOG_ENV;

/// Logs go to stderr; `--debug` overrides `INTAKE_LOG`
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = Config::load();
    let cli = cli.with_config(&config);

    if let Err(e) = app::run(&cli, &config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
