//! Output file naming: payloads are written to a `.part` sibling and renamed
//! onto the final name only once the transfer has completed.

use std::path::{Path, PathBuf};

pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path
/// (e.g. `data.tar.gz.part-00` → `data.tar.gz.part-00.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}
