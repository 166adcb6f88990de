use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::{CoreError, Result};
use crate::models::MovieRecord;

/// Write the ranked list to `path` as JSON, creating parent directories.
pub fn save_snapshot(path: &Path, movies: &[MovieRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(movies)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    tracing::debug!("snapshot with {} movies saved to {}", movies.len(), path.display());
    Ok(())
}

/// Load a previously saved ranked list.
pub fn load_snapshot(path: &Path) -> Result<Vec<MovieRecord>> {
    if !path.exists() {
        return Err(CoreError::SnapshotNotFound(path.display().to_string()));
    }
    let contents = fs::read_to_string(path)?;
    let movies: Vec<MovieRecord> = serde_json::from_str(&contents)?;
    Ok(movies)
}

/// Whether the snapshot at `path` was written less than `ttl` ago.
///
/// A missing or unreadable file is never fresh. A modification time in the
/// future counts as age zero.
pub fn is_fresh(path: &Path, ttl: Duration) -> bool {
    let Ok(modified) = fs::metadata(path).and_then(|m| m.modified()) else {
        return false;
    };
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);
    age < ttl
}
