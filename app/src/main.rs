use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    lpflow::init_logging();
    lpflow::run(lpflow::Cli::parse()).await
}
