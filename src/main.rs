// Task Calendar
// Main entry point

mod cli;

use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Task Calendar");

    let args = cli::Cli::parse();
    if let Err(err) = cli::run(args).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
