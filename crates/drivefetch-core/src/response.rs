//! Response head tracking for the final response of a (possibly redirected) GET.
//!
//! libcurl hands every header line of every hop to the header callback; a new
//! status line starts a fresh head so only the last response is kept.

/// Status and the headers that decide whether a body is the file or a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u32,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub content_length: Option<u64>,
}

impl ResponseHead {
    /// Feed one raw header line (as passed to curl's header function).
    pub fn push_line(&mut self, raw: &[u8]) {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if line.starts_with("HTTP/") {
            *self = ResponseHead {
                status: parse_status(line).unwrap_or(0),
                ..ResponseHead::default()
            };
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-type") {
                self.content_type = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("content-disposition") {
                self.content_disposition = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("content-length") {
                self.content_length = value.parse::<u64>().ok();
            }
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the content type is HTML.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().starts_with("text/html"))
            .unwrap_or(false)
    }

    /// True when the body is the requested file rather than a confirmation page:
    /// a 2xx response that is either an attachment or not HTML.
    pub fn is_payload(&self) -> bool {
        self.is_success() && (self.content_disposition.is_some() || !self.is_html())
    }
}

fn parse_status(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}
