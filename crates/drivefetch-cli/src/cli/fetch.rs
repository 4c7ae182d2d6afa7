//! Default action: fetch every entry of the built-in mapping.

use anyhow::Result;
use drivefetch_core::config::FetchConfig;
use drivefetch_core::fetcher::CurlFetcher;
use drivefetch_core::manifest::ResourceMapping;
use drivefetch_core::runner::FetchRunner;
use std::path::Path;

pub fn run_fetch(cfg: &FetchConfig, output_dir: &Path) -> Result<()> {
    let mapping = ResourceMapping::external_data();
    let fetcher = CurlFetcher::from_config(cfg);
    let mut runner = FetchRunner::new(fetcher, cfg.endpoint.clone(), output_dir);

    let summary = runner.run(&mapping)?;
    tracing::info!(
        files = summary.files,
        bytes = summary.bytes,
        dir = %output_dir.display(),
        "run complete"
    );
    println!("Fetched {} file(s), {} bytes", summary.files, summary.bytes);
    Ok(())
}
