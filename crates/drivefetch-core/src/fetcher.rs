//! The download collaborator: fetch one URL into one local file.
//!
//! [`CurlFetcher`] uses libcurl with redirects and the cookie engine enabled,
//! streams payload bodies to a `.part` sibling of the output path, renames it
//! into place once complete, and follows the provider's large-file
//! confirmation pages.

use crate::config::FetchConfig;
use crate::confirm;
use crate::error::FetchError;
use crate::progress::ProgressMeter;
use crate::response::ResponseHead;
use crate::storage;
use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Confirmation pages are small; anything past this is not kept.
const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

/// Retrieves `url` into `dest`, creating or truncating it. Returns bytes written.
pub trait Fetcher {
    fn fetch(&mut self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

/// libcurl-backed fetcher. One easy handle per file so cookies set by a
/// confirmation page carry over to the follow-up request.
/// Progress lines go to `P` (stderr unless replaced).
#[derive(Debug)]
pub struct CurlFetcher<P = io::Stderr> {
    connect_timeout: Duration,
    low_speed_limit: u32,
    low_speed_time: Duration,
    max_redirections: u32,
    max_confirmations: u32,
    user_agent: Option<String>,
    progress: bool,
    progress_out: P,
}

impl CurlFetcher {
    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            low_speed_limit: cfg.low_speed_limit,
            low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
            max_redirections: cfg.max_redirections,
            max_confirmations: cfg.max_confirmations,
            user_agent: cfg.user_agent.clone(),
            progress: cfg.progress,
            progress_out: io::stderr(),
        }
    }
}

impl<P: Write> CurlFetcher<P> {

    /// Enable or disable the progress line.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Send progress lines to `out` instead of stderr.
    pub fn with_progress_writer<Q: Write>(self, out: Q) -> CurlFetcher<Q> {
        CurlFetcher {
            connect_timeout: self.connect_timeout,
            low_speed_limit: self.low_speed_limit,
            low_speed_time: self.low_speed_time,
            max_redirections: self.max_redirections,
            max_confirmations: self.max_confirmations,
            user_agent: self.user_agent,
            progress: self.progress,
            progress_out: out,
        }
    }

    pub fn progress_writer(&self) -> &P {
        &self.progress_out
    }

    fn new_handle(&self) -> Result<curl::easy::Easy, FetchError> {
        let mut easy = curl::easy::Easy::new();
        easy.follow_location(true)?;
        easy.max_redirections(self.max_redirections)?;
        // Empty path: enable the in-memory cookie engine without reading a file.
        easy.cookie_file("")?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.low_speed_limit(self.low_speed_limit)?;
        easy.low_speed_time(self.low_speed_time)?;
        if let Some(ua) = &self.user_agent {
            easy.useragent(ua)?;
        }
        easy.progress(self.progress)?;
        Ok(easy)
    }

    /// One GET. Either the body was the file (saved to `dest`) or a page to inspect.
    fn perform_once(
        &mut self,
        easy: &mut curl::easy::Easy,
        url: &str,
        dest: &Path,
    ) -> Result<Outcome, FetchError> {
        easy.url(url)?;

        let head = RefCell::new(ResponseHead::default());
        let mut sink = Sink::Pending;
        let mut write_err: Option<io::Error> = None;
        let mut meter = ProgressMeter::new();
        let progress = self.progress;
        let out = &mut self.progress_out;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                head.borrow_mut().push_line(data);
                true
            })?;
            transfer.write_function(|data| {
                match sink.write(data, &head.borrow(), dest) {
                    Ok(()) => Ok(data.len()),
                    Err(e) => {
                        write_err = Some(e);
                        Ok(0) // abort transfer
                    }
                }
            })?;
            if progress {
                transfer.progress_function(|dltotal, dlnow, _, _| {
                    let head = head.borrow();
                    if head.is_payload() {
                        let total = match dltotal as u64 {
                            0 => head.content_length.unwrap_or(0),
                            t => t,
                        };
                        if let Some(line) = meter.tick(dlnow as u64, total) {
                            let _ = write!(out, "\r{}", line);
                            let _ = out.flush();
                        }
                    }
                    true
                })?;
            }
            transfer.perform()
        };

        if let Some(e) = write_err {
            return Err(FetchError::storage(dest, e));
        }
        performed?;

        let status = easy.response_code()?;
        if !(200..300).contains(&status) {
            return Err(FetchError::Http {
                status,
                url: url.to_string(),
            });
        }

        let head = head.into_inner();
        if head.is_payload() {
            let written = sink.finish(dest).map_err(|e| FetchError::storage(dest, e))?;
            if progress && written > 0 {
                let total = head.content_length.unwrap_or(written);
                let _ = writeln!(self.progress_out, "\r{}", meter.finish(written, total));
            }
            return Ok(Outcome::Saved(written));
        }

        let effective_url = easy.effective_url()?.unwrap_or(url).to_string();
        let body = match sink {
            Sink::Page(buf) => String::from_utf8_lossy(&buf).into_owned(),
            _ => String::new(),
        };
        Ok(Outcome::Page {
            body,
            effective_url,
        })
    }
}

impl<P: Write> Fetcher for CurlFetcher<P> {
    fn fetch(&mut self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let mut easy = self.new_handle()?;
        let mut next = Url::parse(url)?;
        let mut confirmations = 0u32;
        loop {
            match self.perform_once(&mut easy, next.as_str(), dest)? {
                Outcome::Saved(written) => {
                    tracing::debug!(
                        url = %next,
                        dest = %dest.display(),
                        bytes = written,
                        "saved"
                    );
                    return Ok(written);
                }
                Outcome::Page {
                    body,
                    effective_url,
                } => {
                    if confirmations >= self.max_confirmations {
                        return Err(FetchError::TooManyConfirmations(confirmations));
                    }
                    confirmations += 1;
                    let base = Url::parse(&effective_url)?;
                    next = confirm::next_url_from_page(&body, &base)?;
                    tracing::debug!(
                        from = %effective_url,
                        to = %next,
                        "following confirmation page"
                    );
                }
            }
        }
    }
}

enum Outcome {
    Saved(u64),
    Page { body: String, effective_url: String },
}

/// Where body bytes go. Decided on the first chunk from the final response head.
/// Payload bytes land in the `.part` temp file; the output file itself is only
/// replaced by the rename in [`Sink::finish`].
enum Sink {
    Pending,
    File {
        file: File,
        temp: PathBuf,
        written: u64,
    },
    Page(Vec<u8>),
}

impl Sink {
    fn write(&mut self, data: &[u8], head: &ResponseHead, dest: &Path) -> io::Result<()> {
        match self {
            Sink::File { file, written, .. } => {
                file.write_all(data)?;
                *written += data.len() as u64;
                Ok(())
            }
            Sink::Page(buf) => {
                let room = MAX_PAGE_BYTES.saturating_sub(buf.len());
                buf.extend_from_slice(&data[..data.len().min(room)]);
                Ok(())
            }
            Sink::Pending => {
                *self = if head.is_payload() {
                    let temp = storage::temp_path(dest);
                    Sink::File {
                        file: File::create(&temp)?,
                        temp,
                        written: 0,
                    }
                } else {
                    Sink::Page(Vec::new())
                };
                self.write(data, head, dest)
            }
        }
    }

    /// Move the completed payload onto `dest` and return its length.
    /// An empty body still yields an (empty) file.
    fn finish(self, dest: &Path) -> io::Result<u64> {
        match self {
            Sink::Pending => {
                File::create(dest)?;
                Ok(0)
            }
            Sink::File {
                mut file,
                temp,
                written,
            } => {
                file.flush()?;
                drop(file);
                fs::rename(&temp, dest)?;
                Ok(written)
            }
            Sink::Page(_) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "confirmation page is not file content",
            )),
        }
    }
}
