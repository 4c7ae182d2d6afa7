//! CLI for drivefetch: download the external data set into a directory.

mod fetch;

use anyhow::Result;
use clap::Parser;
use drivefetch_core::config::{self, FetchConfig};
use std::path::PathBuf;

use fetch::run_fetch;

/// Download the external data archive parts and checksum from Google Drive.
#[derive(Debug, Parser)]
#[command(name = "drivefetch", version)]
#[command(about = "Download the external data set from Google Drive", long_about = None)]
pub struct Cli {
    /// Directory to write the files into (default: current directory).
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Do not print the per-file progress line.
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Read settings from this TOML file instead of ~/.config/drivefetch/config.toml.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        Cli::parse().run()
    }

    fn load_config(&self) -> Result<FetchConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_default()?,
        };
        if self.quiet {
            cfg.progress = false;
        }
        Ok(cfg)
    }

    fn run(self) -> Result<()> {
        let cfg = self.load_config()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let output_dir = match self.output_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        run_fetch(&cfg, &output_dir)
    }
}
