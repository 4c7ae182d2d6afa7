//! Download URL construction.
//!
//! Embeds a remote id into the provider's public download endpoint:
//! `<endpoint>?export=download&id=<remote_id>`.

use url::Url;

/// Builds the download URL for `remote_id` under `endpoint`.
///
/// Query parameters already present on `endpoint` are kept; `export` and `id`
/// are appended after them.
///
/// # Examples
///
/// - `build_download_url("https://drive.google.com/uc", "abc")` →
///   `"https://drive.google.com/uc?export=download&id=abc"`
pub fn build_download_url(endpoint: &str, remote_id: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(endpoint)?;
    url.query_pairs_mut()
        .append_pair("export", "download")
        .append_pair("id", remote_id);
    Ok(url.into())
}
