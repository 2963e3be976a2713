mod app;
mod cli;
mod config;
mod consts;
mod core;
mod error;
mod output;
mod pricing;
mod source;
mod utils;

use clap::Parser;

use cli::Cli;
use config::Config;
use error::AppError;
use utils::init_logging;

fn load_config(cli: &Cli) -> Result<Config, AppError> {
    match &cli.config {
        Some(path) => Config::load_from(path),
        None => Ok(Config::load()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.quiet);

    let result = load_config(&cli).and_then(|config| {
        let cli = cli.with_config(config);
        app::run(&cli)
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        if let Some(hint) = e.hint() {
            eprintln!("hint: {hint}");
        }
        if e.is_retryable() {
            eprintln!("note: this failure is temporary; re-running later may succeed");
        }
        std::process::exit(e.exit_code());
    }
}
