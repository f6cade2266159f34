use clap::Parser;
use std::path::PathBuf;

/// Reconciles mint fee payments against observed collection transfers.
#[derive(Parser)]
pub struct Args {
    /// Path to the toml configuration file
    #[arg(long, default_value = "mintrecon.toml")]
    pub config_path: PathBuf,
}
