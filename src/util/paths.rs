use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use crate::util::{human, CorralResult};

/// Expand a leading `~` or `~/` to the user's home directory. Anything else
/// (including `~other_user/...`, which cower's C original does not support
/// either) is returned unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') {
            if let Some(home) = std::env::var_os("HOME") {
                let mut expanded = PathBuf::from(home);
                if let Some(rest) = rest.strip_prefix('/') {
                    expanded.push(rest);
                }
                return expanded;
            }
        }
    }
    PathBuf::from(path)
}

pub fn read(path: &Path) -> CorralResult<String> {
    (|| -> std::io::Result<_> {
        let mut ret = String::new();
        let mut f = File::open(path)?;
        f.read_to_string(&mut ret)?;
        Ok(ret)
    })()
    .map_err(|e| human(format!("failed to read `{}`: {}", path.display(), e)))
}
