use anyhow::Result;
use bottlebook::cli::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    bottlebook::logging::init(cli.verbose);
    cli.run().await
}
