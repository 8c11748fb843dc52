use clap::Parser;
use tracing::Level;

use blessings::cli::commands::Cli;
use blessings::cli::handlers;

fn main() {
    let cli = Cli::parse();

    // Store warnings are reported by the handlers; tracing carries diagnostics
    let level = if cli.verbose { Level::DEBUG } else { Level::ERROR };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
