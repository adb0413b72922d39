//! Archive extractor adapter (C4): unpacks a downloaded tarball into the
//! current working directory and reports its top-level directory name.
//!
//! `tar::Archive` is generic over any `Read`, so swapping the decoder
//! (bzip2/xz/zstd) behind a `flate2::read::GzDecoder` would not touch the
//! walk below.
use std::io::Read;
use std::path::PathBuf;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::util::{human, CorralResult};

/// Extract `bytes` (a gzip-compressed tar stream) into the current working
/// directory, returning the first entry that is itself a directory (trailing
/// `/` stripped), or the empty string if the archive contains no directory
/// entry at all. A non-fatal entry (one the underlying library can warn and
/// skip) is logged via `warn` and does not stop the walk; anything else
/// aborts with the library's error wrapped as a human-readable message.
pub fn extract<R: Read>(reader: R, warn: &mut dyn FnMut(String)) -> CorralResult<String> {
    let decoder = GzDecoder::new(reader);
    let mut archive = Archive::new(decoder);
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.set_overwrite(true);

    let mut top_level_dir: Option<String> = None;

    let entries = archive
        .entries()
        .map_err(|e| human(format!("failed to read archive: {}", e)))?;

    for entry in entries {
        let mut entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn(format!("skipping malformed archive entry: {}", e));
                continue;
            }
        };

        let path = match entry.path() {
            Ok(path) => path.into_owned(),
            Err(e) => {
                warn(format!("skipping archive entry with bad path: {}", e));
                continue;
            }
        };

        if top_level_dir.is_none() && entry.header().entry_type().is_dir() {
            if let Some(first) = path.components().next() {
                top_level_dir = Some(first.as_os_str().to_string_lossy().trim_end_matches('/').to_string());
            }
        }

        if let Err(e) = entry.unpack_in(".") {
            warn(format!("skipping `{}`: {}", path.display(), e));
        }
    }

    Ok(top_level_dir.unwrap_or_default())
}

/// Convenience wrapper used by C6's `task_download`: the resulting
/// top-level directory joined with `PKGBUILD`, ready to be read by the
/// recipe parser (C3).
pub fn pkgbuild_path(top_level_dir: &str) -> PathBuf {
    PathBuf::from(top_level_dir).join("PKGBUILD")
}
