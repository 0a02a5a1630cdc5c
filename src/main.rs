use anyhow::Result;
use clap::Parser;
use tindahero::cli::Cli;
use tindahero::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    cli.run().await
}
