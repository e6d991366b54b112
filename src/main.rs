use ridebook::config::Config;
use ridebook::runner;

use anyhow::Context;
use std::path::PathBuf;
use tracing::subscriber;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let subscriber = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .finish();
    subscriber::set_global_default(subscriber)?;

    let input = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: ridebook <input-file>")?;

    runner::run(&input, &config.output_path, config.run_options()).await?;

    Ok(())
}
