// Tharsis - Command line client for the Tharsis API
use clap::Parser;
use tharsis::cli::{self, Args};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    std::process::exit(cli::run(args).await);
}
