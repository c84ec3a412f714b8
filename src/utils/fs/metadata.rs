//! File metadata helpers.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Modification time of `path` in milliseconds since the Unix epoch.
///
/// # Errors
///
/// Returns an error if the metadata cannot be read (e.g. the file is missing).
pub fn modified_ms(path: &Path) -> Result<u64> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to get modification time for: {}", path.display()))?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).unwrap_or_default();
    Ok(u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    #[test]
    fn test_modified_ms_tracks_set_modified() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("a.pug");
        fs::write(&path, "p").unwrap();

        let stamp = SystemTime::UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        fs::File::options().write(true).open(&path).unwrap().set_modified(stamp).unwrap();
        assert_eq!(modified_ms(&path).unwrap(), 1_700_000_000_123);
    }

    #[test]
    fn test_modified_ms_missing_file() {
        let temp = tempdir().unwrap();
        assert!(modified_ms(&temp.path().join("missing.pug")).is_err());
    }
}
