//! On-disk form of the cache and dependency graph.
//!
//! ```json
//! {
//!   "version": 2,
//!   "saved_at": "2025-01-01T00:00:00Z",
//!   "parse_results": [["/app/views/page.pug", { "errors": [], "contract": { ... }, "mtime_ms": 1700000000000, "engine": "tsc", "stale": false }]],
//!   "dependency_graph": [["/app/views/page.pug", ["/app/views/layout.pug", "/app/types/user.ts"]]],
//!   "input_times": [["/app/types/user.ts", 1700000000000]]
//! }
//! ```
//!
//! The document is written atomically. Staleness is re-derived from file
//! times after loading, so a stale flag saved by an interrupted run is
//! harmless.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ParseResultCache, ParseResultEntry};
use crate::constants::CACHE_FORMAT_VERSION;
use crate::core::PugcheckError;
use crate::resolver::DependencyGraph;
use crate::utils::fs::atomic_write;

#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    parse_results: Vec<(PathBuf, ParseResultEntry)>,
    dependency_graph: Vec<(PathBuf, Vec<PathBuf>)>,
    #[serde(default)]
    input_times: Vec<(PathBuf, u64)>,
}

const fn default_version() -> u32 {
    CACHE_FORMAT_VERSION
}

/// Write the cache and graph to `path`.
pub fn save(cache: &ParseResultCache, graph: &DependencyGraph, path: &Path) -> Result<()> {
    let document = CacheDocument {
        version: CACHE_FORMAT_VERSION,
        saved_at: Some(Utc::now()),
        parse_results: cache.iter().map(|(file, entry)| (file.clone(), entry.clone())).collect(),
        dependency_graph: graph.edges(),
        input_times: cache.inputs().map(|(file, time)| (file.clone(), *time)).collect(),
    };
    let data = serde_json::to_vec_pretty(&document)?;
    atomic_write(path, &data).with_context(|| format!("Failed to save cache to {}", path.display()))?;
    debug!("Saved {} cache entries to {}", cache.len(), path.display());
    Ok(())
}

/// Read a saved cache. Returns `None` when `path` does not exist.
///
/// Entries come back exactly as saved; callers re-derive staleness with
/// [`ParseResultCache::mark_stale_files`].
pub fn load(path: &Path) -> Result<Option<(ParseResultCache, DependencyGraph)>> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(PugcheckError::CacheReadError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into());
        }
    };

    let document: CacheDocument = serde_json::from_slice(&data).map_err(|e| PugcheckError::CacheReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if document.version != CACHE_FORMAT_VERSION {
        return Err(PugcheckError::CacheVersionMismatch {
            found: document.version,
            expected: CACHE_FORMAT_VERSION,
        }
        .into());
    }

    let mut cache = ParseResultCache::new();
    for (file, entry) in document.parse_results {
        cache.insert(file, entry);
    }
    for (file, time) in document.input_times {
        cache.insert_input(file, time);
    }
    let graph = DependencyGraph::from_edges(document.dependency_graph);

    match document.saved_at {
        Some(saved_at) => info!("Loaded {} cached template(s) saved at {saved_at}", cache.len()),
        None => info!("Loaded {} cached template(s)", cache.len()),
    }
    Ok(Some((cache, graph)))
}
