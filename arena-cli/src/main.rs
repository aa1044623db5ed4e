use anyhow::Result;
use arena_cli::{cli::Cli, settings::Settings};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;
    cli.run(settings).await?;

    Ok(())
}
