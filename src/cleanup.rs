//! Removal of temporary decoder inputs and samples.

use crate::error::Result;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Delete the files of `dir` matching any of the glob `patterns`.
///
/// Returns the number of files removed. A file that cannot be removed is
/// logged and skipped; an invalid pattern is an error. A missing directory
/// removes nothing.
pub fn cleanup_temp_files(dir: &Path, patterns: &[String]) -> Result<usize> {
    if !dir.is_dir() {
        debug!("Nothing to clean: {} does not exist", dir.display());
        return Ok(0);
    }

    let mut removed = 0usize;
    for pattern in patterns {
        let full_pattern = dir.join(pattern);
        let full_pattern = full_pattern.to_string_lossy();

        for entry in glob::glob(&full_pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Cannot read {}: {}", e.path().display(), e);
                    continue;
                }
            };

            if !path.is_file() {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed {}", path.display());
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }

    info!("Cleanup removed {} files from {}", removed, dir.display());
    Ok(removed)
}
