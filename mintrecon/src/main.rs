use anyhow::{Context, Result};
use clap::Parser;
use mintrecon::{Args, ReconRunner};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    ReconRunner::run(args).await.context("run reconciliation")?;

    Ok(())
}
