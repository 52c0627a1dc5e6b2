use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod replay;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();

    // stdout carries outcome JSON only; logs go to stderr.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("INVTRACK_LOG"))
        .unwrap_or_else(|_| EnvFilter::new("invtrack=info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = config::Config::load(&args.config)?;
    let fixture_path = args.fixture.unwrap_or_else(|| config.replay.fixture.clone());
    let fixture = replay::Fixture::load(&fixture_path)?;
    tracing::info!(
        fixture = %fixture_path,
        guilds = fixture.guilds.len(),
        frames = fixture.frames.len(),
        "replaying recorded session"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    replay::replay(fixture, config.tracker_config(), |event| {
        serde_json::to_writer(&mut out, event).context("failed to encode tracker event")?;
        writeln!(out).context("failed to write tracker event")?;
        Ok(())
    })
    .await?;
    out.flush()?;

    Ok(())
}
