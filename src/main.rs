use std::fs::File;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use banksim::{bank, batch, cli, console};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let registry = if cli.no_demo {
        bank::Registry::new()
    } else {
        bank::Registry::with_demo_accounts()
    };
    let (state, handle) = bank::State::new(registry);
    let task = tokio::spawn(state.run());

    match &cli.batch {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open batch file {}", path.display()))?;
            batch::run(&handle, file).await?;
            match &cli.statement {
                Some(number) => handle.statement(number).await?.write_csv(std::io::stdout())?,
                None => batch::write_summaries(&handle.list().await?, std::io::stdout())?,
            }
        }
        None => {
            let input = BufReader::new(tokio::io::stdin());
            console::Console::new(input, tokio::io::stdout(), handle.clone())
                .run()
                .await?;
        }
    }

    drop(handle); // Close the channel so the state task can finish
    let registry = task.await.context("Failed to join the state handling task")?;
    tracing::info!(accounts = registry.len(), "session finished");
    Ok(())
}
