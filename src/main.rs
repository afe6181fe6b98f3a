use clap::Parser;

use rusty_fanout::cli::{run, FanoutArgs};

#[tokio::main]
async fn main() {
    let args = FanoutArgs::parse();
    if let Err(err) = run(args).await {
        tracing::error!(error = %err, "execution failed");
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
