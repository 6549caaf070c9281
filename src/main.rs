use clap::Parser;

use parimarket::adapter::inbound::cli::{self, command::Cli, output};

fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli) {
        output::error(&e.to_string());
        std::process::exit(if e.is_client_error() { 2 } else { 1 });
    }
}
