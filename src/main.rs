// main.rs
use clap::Parser;
use tracing_subscriber::EnvFilter;

use soulmates::cli::{self, Args};
use soulmates::config::Config;

fn init_logging(args: &Args) {
    // RUST_LOG wins; otherwise use the filter from config.json when it can be read
    let fallback = Config::new(args.data_dir.clone())
        .map(|c| c.log_filter)
        .unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(e) = cli::run(args) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}
