//! Minimal HTTP/1.1 stand-in for the provider's download endpoint.
//!
//! Serves `GET /uc?...&id=<id>` according to a per-id [`Reply`] and records the
//! request target of every request it sees. One request per connection
//! (`Connection: close`).

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 attachment with this body.
    File(Vec<u8>),
    /// Warning page with a `download-form`; the `confirm=t` follow-up gets the body.
    ConfirmForm(Vec<u8>),
    /// Warning page with a legacy `/uc?...confirm=` link plus a `download_warning`
    /// cookie; the follow-up only gets the body when the cookie is sent back.
    ConfirmHref(Vec<u8>),
    /// Warning page every time, even with `confirm` set.
    EndlessConfirm,
    /// Quota-exceeded page with no link.
    QuotaPage,
    /// Bare status code with a small HTML body.
    Status(u16),
    /// Attachment advertising `advertised` bytes but closing after `body`.
    Truncated { body: Vec<u8>, advertised: usize },
}

pub struct DriveServer {
    base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl DriveServer {
    /// Starts a server in a background thread. Runs until the process exits.
    pub fn start(replies: HashMap<String, Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let replies = Arc::new(replies);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let replies = Arc::clone(&replies);
                let log = Arc::clone(&log);
                thread::spawn(move || handle(stream, &replies, &log));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}", port),
            requests,
        }
    }

    /// Endpoint to put in `FetchConfig::endpoint`.
    pub fn endpoint(&self) -> String {
        format!("{}/uc", self.base)
    }

    /// Request targets seen so far, e.g. `/uc?export=download&id=abc`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

struct Request {
    target: String,
    params: HashMap<String, String>,
    cookie: Option<String>,
}

fn handle(mut stream: TcpStream, replies: &HashMap<String, Reply>, log: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    log.lock().unwrap().push(req.target.clone());

    let id = req.params.get("id").cloned().unwrap_or_default();
    let confirmed = req.params.contains_key("confirm");
    let reply = match replies.get(&id) {
        Some(r) => r.clone(),
        None => Reply::Status(404),
    };

    match reply {
        Reply::File(body) => send_file(&mut stream, &id, &body),
        Reply::ConfirmForm(body) => {
            if confirmed {
                send_file(&mut stream, &id, &body);
            } else {
                let page = format!(
                    "<html><body><p>Google Drive can't scan this file for viruses.</p>\
                     <form id=\"download-form\" action=\"/uc\" method=\"get\">\
                     <input type=\"submit\" id=\"uc-download-link\" value=\"Download anyway\"/>\
                     <input type=\"hidden\" name=\"id\" value=\"{}\">\
                     <input type=\"hidden\" name=\"export\" value=\"download\">\
                     <input type=\"hidden\" name=\"confirm\" value=\"t\">\
                     </form></body></html>",
                    id
                );
                send(&mut stream, "200 OK", "text/html; charset=utf-8", &[], page.as_bytes());
            }
        }
        Reply::ConfirmHref(body) => {
            let cookie_name = format!("download_warning_{}", id);
            if confirmed {
                let has_cookie = req
                    .cookie
                    .as_deref()
                    .map(|c| c.contains(&cookie_name))
                    .unwrap_or(false);
                if has_cookie {
                    send_file(&mut stream, &id, &body);
                } else {
                    send(&mut stream, "403 Forbidden", "text/html", &[], b"<html>no cookie</html>");
                }
            } else {
                let page = format!(
                    "<html><body><a id=\"uc-download-link\" \
                     href=\"/uc?export=download&amp;confirm=AbCd&amp;id={}\">Download anyway</a>\
                     </body></html>",
                    id
                );
                let set_cookie = format!("Set-Cookie: {}=AbCd; Path=/", cookie_name);
                send(
                    &mut stream,
                    "200 OK",
                    "text/html; charset=utf-8",
                    &[set_cookie.as_str()],
                    page.as_bytes(),
                );
            }
        }
        Reply::EndlessConfirm => {
            let page = format!(
                "<html><form id=\"download-form\" action=\"/uc\">\
                 <input type=\"hidden\" name=\"id\" value=\"{}\">\
                 <input type=\"hidden\" name=\"confirm\" value=\"t\"></form></html>",
                id
            );
            send(&mut stream, "200 OK", "text/html", &[], page.as_bytes());
        }
        Reply::QuotaPage => {
            let page = "<html><body><div class=\"uc-error-caption\">Sorry, you can't view or download this file at this time.</div>\
                        <p class=\"uc-error-subcaption\">Too many users have viewed or downloaded this file recently.</p></body></html>";
            send(&mut stream, "200 OK", "text/html", &[], page.as_bytes());
        }
        Reply::Truncated { body, advertised } => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\n\
                 Content-Disposition: attachment; filename=\"{}.bin\"\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n",
                id, advertised
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
            let _ = stream.flush();
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        Reply::Status(code) => {
            let status = match code {
                404 => "404 Not Found".to_string(),
                500 => "500 Internal Server Error".to_string(),
                other => format!("{} Error", other),
            };
            send(&mut stream, &status, "text/html", &[], b"<html>error</html>");
        }
    }
}

fn send_file(stream: &mut TcpStream, id: &str, body: &[u8]) {
    let disposition = format!("Content-Disposition: attachment; filename=\"{}.bin\"", id);
    send(
        stream,
        "200 OK",
        "application/octet-stream",
        &[disposition.as_str()],
        body,
    );
}

fn send(stream: &mut TcpStream, status: &str, content_type: &str, extra: &[&str], body: &[u8]) {
    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        content_type,
        body.len()
    );
    for h in extra {
        head.push_str(h);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let text = String::from_utf8_lossy(&buf).into_owned();
    let mut lines = text.lines();
    let target = lines.next()?.split_whitespace().nth(1)?.to_string();

    let mut cookie = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("cookie") {
                cookie = Some(value.trim().to_string());
            }
        }
    }

    let parsed = url::Url::parse(&format!("http://localhost{}", target)).ok()?;
    let params = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    Some(Request {
        target,
        params,
        cookie,
    })
}
