mod cli;
mod error;
mod executor;
mod fmt;
mod reports;
mod settings;
mod tui;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        None => cli::dashboard::run(),
        Some(Commands::Report { command }) => cli::report::dispatch(command),
        Some(Commands::Status) => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
