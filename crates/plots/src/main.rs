use clap::Parser;
use plots::Cli;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = plots::run(cli).await {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}
