//! Large-file confirmation page handling.
//!
//! For files too large to virus-scan the provider answers the download URL with
//! an HTML warning page instead of the file. The page carries the real link in
//! one of a few shapes; this module extracts it.

use crate::error::FetchError;
use url::Url;

const UC_HREF_PREFIX: &str = "/uc?export=download";
const DOWNLOAD_FORM_ID: &str = "id=\"download-form\"";
const DOWNLOAD_URL_FIELD: &str = "\"downloadUrl\":\"";
const ERROR_CAPTION: &str = "<p class=\"uc-error-subcaption\">";

/// Resolves the next URL to request from a confirmation page.
///
/// `base` is the effective URL the page was served from; relative links are
/// joined onto it. Tries, in order: a `/uc?export=download...` link, the
/// `download-form` with its hidden inputs, and a JSON `downloadUrl` field.
pub fn next_url_from_page(page: &str, base: &Url) -> Result<Url, FetchError> {
    if let Some(href) = find_uc_href(page) {
        return Ok(base.join(&href)?);
    }
    if let Some((action, params)) = find_download_form(page) {
        let mut url = base.join(&action)?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &params {
                pairs.append_pair(name, value);
            }
        }
        return Ok(url);
    }
    if let Some(link) = find_json_download_url(page) {
        return Ok(base.join(&link)?);
    }
    let reason = error_caption(page).unwrap_or_else(|| "no download link on page".to_string());
    Err(FetchError::NoPublicLink { reason })
}

/// `href="/uc?export=download&amp;confirm=...&amp;id=..."`, unescaped.
fn find_uc_href(page: &str) -> Option<String> {
    let needle = format!("href=\"{}", UC_HREF_PREFIX);
    let start = page.find(&needle)? + "href=\"".len();
    let end = start + page[start..].find('"')?;
    Some(html_unescape(&page[start..end]))
}

/// `<form id="download-form" action="...">` and its hidden inputs.
fn find_download_form(page: &str) -> Option<(String, Vec<(String, String)>)> {
    let id_pos = page.find(DOWNLOAD_FORM_ID)?;
    let form_start = page[..id_pos].rfind("<form")?;
    let tag_end = form_start + page[form_start..].find('>')?;
    let action = attr(&page[form_start..=tag_end], "action")?;
    let body_end = page[tag_end..]
        .find("</form>")
        .map(|i| tag_end + i)
        .unwrap_or(page.len());

    let mut params = Vec::new();
    let mut rest = &page[tag_end..body_end];
    while let Some(i) = rest.find("<input") {
        let tag = &rest[i..];
        let close = tag.find('>').unwrap_or(tag.len());
        let tag = &tag[..close];
        let is_hidden = attr(tag, "type")
            .map(|t| t.eq_ignore_ascii_case("hidden"))
            .unwrap_or(false);
        if is_hidden {
            if let Some(name) = attr(tag, "name") {
                params.push((name, attr(tag, "value").unwrap_or_default()));
            }
        }
        rest = &rest[i + close..];
    }
    Some((html_unescape(&action), params))
}

/// `"downloadUrl":"https:\/\/...=...&..."`, unescaped.
fn find_json_download_url(page: &str) -> Option<String> {
    let start = page.find(DOWNLOAD_URL_FIELD)? + DOWNLOAD_URL_FIELD.len();
    let end = start + page[start..].find('"')?;
    let raw = &page[start..end];
    let link = raw
        .replace("\\u003d", "=")
        .replace("\\u0026", "&")
        .replace("\\/", "/");
    if link.is_empty() {
        None
    } else {
        Some(link)
    }
}

/// Human-readable error text the provider puts on quota/permission pages.
fn error_caption(page: &str) -> Option<String> {
    let start = page.find(ERROR_CAPTION)? + ERROR_CAPTION.len();
    let end = start + page[start..].find("</p>")?;
    let text = html_unescape(&strip_tags(&page[start..end]));
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Value of attribute `name` inside a single tag, double- or single-quoted.
fn attr(tag: &str, name: &str) -> Option<String> {
    let bytes = tag.as_bytes();
    let mut from = 0;
    while let Some(i) = tag[from..].find(name) {
        let pos = from + i;
        from = pos + name.len();
        let preceded_by_space = pos > 0 && bytes[pos - 1].is_ascii_whitespace();
        if !preceded_by_space {
            continue;
        }
        let after = tag[from..].trim_start();
        let Some(after) = after.strip_prefix('=') else {
            continue;
        };
        let after = after.trim_start();
        let quote = after.chars().next()?;
        if quote != '"' && quote != '\'' {
            continue;
        }
        let value = &after[1..];
        let end = value.find(quote)?;
        return Some(value[..end].to_string());
    }
    None
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn html_unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
