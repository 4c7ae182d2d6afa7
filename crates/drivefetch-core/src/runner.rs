//! Fetch runner: one sequential pass over the resource mapping.
//!
//! Each entry is fetched to completion before the next starts. The first
//! failure aborts the run; later entries are never requested and partially
//! written files are left as they are.

use anyhow::{Context, Result};
use crate::fetcher::Fetcher;
use crate::manifest::ResourceMapping;
use crate::url_model::build_download_url;
use std::io::{self, Write};
use std::path::PathBuf;

/// What a completed run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub bytes: u64,
}

/// Notices (`Downloading <name>...`) go to `W`, stdout unless replaced.
pub struct FetchRunner<F, W = io::Stdout> {
    fetcher: F,
    endpoint: String,
    output_dir: PathBuf,
    notices: W,
}

impl<F: Fetcher> FetchRunner<F> {
    /// `endpoint` is the download endpoint ids are embedded into; files land in `output_dir`.
    pub fn new(fetcher: F, endpoint: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
            output_dir: output_dir.into(),
            notices: io::stdout(),
        }
    }
}

impl<F: Fetcher, W: Write> FetchRunner<F, W> {
    pub fn with_notices<V: Write>(self, notices: V) -> FetchRunner<F, V> {
        FetchRunner {
            fetcher: self.fetcher,
            endpoint: self.endpoint,
            output_dir: self.output_dir,
            notices,
        }
    }

    pub fn into_parts(self) -> (F, W) {
        (self.fetcher, self.notices)
    }

    pub fn into_fetcher(self) -> F {
        self.fetcher
    }

    /// Download every entry in order, printing a notice before each one.
    pub fn run(&mut self, mapping: &ResourceMapping) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for entry in mapping {
            let url = build_download_url(&self.endpoint, &entry.remote_id)
                .with_context(|| format!("bad endpoint {:?}", self.endpoint))?;
            let dest = self.output_dir.join(&entry.output_filename);

            writeln!(self.notices, "Downloading {}...", entry.output_filename)?;
            self.notices.flush()?;
            tracing::info!(
                file = %entry.output_filename,
                id = %entry.remote_id,
                "download start"
            );

            let bytes = self
                .fetcher
                .fetch(&url, &dest)
                .with_context(|| format!("download failed: {}", entry.output_filename))?;

            tracing::info!(file = %entry.output_filename, bytes, "download complete");
            summary.files += 1;
            summary.bytes += bytes;
        }
        Ok(summary)
    }
}
