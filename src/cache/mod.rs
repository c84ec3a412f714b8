//! Parse result cache.
//!
//! The cache remembers, per template, the errors of its last check, its
//! contract, the file's modification time and the engine that checked it. It
//! also remembers the modification time of every other input a template
//! depends on (imported type modules, the shared-locals declaration, layouts
//! and partials outside the template paths). Together with the
//! [`DependencyGraph`] it decides which templates a run has to reprocess:
//!
//! 1. [`ParseResultCache::mark_stale_files`] re-stats every cached file and
//!    every tracked input. A changed time marks the entry (or the input's
//!    dependents) stale; a missing template is evicted after its cached
//!    dependents are flagged.
//! 2. [`ParseResultCache::mark_stale_dependents`] flags every transitive
//!    dependent of a stale template, so editing a layout rechecks every page
//!    that extends it.
//! 3. The checker reprocesses exactly the templates that are stale or not
//!    cached at all.
//!
//! The cache and graph are persisted together by [`persist`].

pub mod persist;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::contract::Contract;
use crate::diagnostics::TemplateError;
use crate::resolver::DependencyGraph;
use crate::utils::fs::modified_ms;

/// Last check result for one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResultEntry {
    pub errors: Vec<TemplateError>,
    /// `None` when the template could not be read.
    pub contract: Option<Contract>,
    /// Modification time when checked, in milliseconds since the epoch; `0`
    /// when it could not be read.
    pub mtime_ms: u64,
    /// Name of the engine that produced `errors`.
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub stale: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResultCache {
    entries: BTreeMap<PathBuf, ParseResultEntry>,
    /// Modification times of dependencies, `0` for files that did not exist.
    inputs: BTreeMap<PathBuf, u64>,
}

impl ParseResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of checking `file` with `engine`, stamped with its
    /// current modification time.
    pub fn set(&mut self, file: &Path, engine: &str, errors: Vec<TemplateError>, contract: Option<Contract>) {
        let mtime_ms = match modified_ms(file) {
            Ok(time) => time,
            Err(e) => {
                warn!("Caching {} without a modification time: {e:#}", file.display());
                0
            }
        };
        self.insert(
            file.to_path_buf(),
            ParseResultEntry {
                errors,
                contract,
                mtime_ms,
                engine: engine.to_string(),
                stale: false,
            },
        );
    }

    /// Remember the current modification time of each dependency.
    pub fn track_inputs<I>(&mut self, files: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        for file in files {
            let time = modified_ms(&file).unwrap_or(0);
            self.inputs.insert(file, time);
        }
    }

    /// Record a dependency time as is.
    pub fn insert_input(&mut self, file: PathBuf, mtime_ms: u64) {
        self.inputs.insert(file, mtime_ms);
    }

    pub fn inputs(&self) -> impl Iterator<Item = (&PathBuf, &u64)> {
        self.inputs.iter()
    }

    /// Insert an entry as is.
    pub fn insert(&mut self, file: PathBuf, entry: ParseResultEntry) {
        self.entries.insert(file, entry);
    }

    pub fn get(&self, file: &Path) -> Option<&ParseResultEntry> {
        self.entries.get(file)
    }

    pub fn remove(&mut self, file: &Path) -> Option<ParseResultEntry> {
        self.entries.remove(file)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.inputs.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &ParseResultEntry)> {
        self.entries.iter()
    }

    /// Flag one entry stale. Returns `false` when `file` is not cached.
    pub fn mark_stale(&mut self, file: &Path) -> bool {
        match self.entries.get_mut(file) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    /// Cached files currently flagged stale.
    pub fn stale_files(&self) -> Vec<PathBuf> {
        self.entries.iter().filter(|(_, entry)| entry.stale).map(|(file, _)| file.clone()).collect()
    }

    /// Whether `file` must be processed by `engine`: not cached, cached but
    /// stale, or cached from a different engine.
    pub fn needs_processing(&self, file: &Path, engine: &str) -> bool {
        self.entries.get(file).is_none_or(|entry| entry.stale || entry.engine != engine)
    }

    /// Re-stat every cached file and tracked input and flag the changed ones,
    /// then cascade.
    ///
    /// Templates that no longer exist are evicted together with their outgoing
    /// edges; their cached dependents are flagged first. Inputs nothing
    /// depends on any more are forgotten. Returns the evicted paths.
    pub fn mark_stale_files(&mut self, graph: &mut DependencyGraph) -> Vec<PathBuf> {
        let mut evicted = Vec::new();
        self.inputs.retain(|file, _| !graph.dependents_of(file).is_empty());

        let mut changed_inputs = Vec::new();
        for (file, recorded) in &mut self.inputs {
            let time = modified_ms(file).unwrap_or(0);
            if time != *recorded {
                debug!("Input {} changed ({recorded} -> {time})", file.display());
                *recorded = time;
                changed_inputs.push(file.clone());
            }
        }
        for file in &changed_inputs {
            for dependent in graph.dependents_of(file) {
                self.mark_stale(&dependent);
            }
        }

        for (file, entry) in &mut self.entries {
            match modified_ms(file) {
                Ok(time) if time != entry.mtime_ms => {
                    debug!("{} changed ({} -> {time})", file.display(), entry.mtime_ms);
                    entry.stale = true;
                }
                Ok(_) => {}
                Err(_) if !file.exists() => evicted.push(file.clone()),
                Err(e) => {
                    warn!("Treating {} as changed: {e:#}", file.display());
                    entry.stale = true;
                }
            }
        }

        for file in &evicted {
            debug!("{} no longer exists; evicting", file.display());
            for dependent in graph.dependents_of(file) {
                self.mark_stale(&dependent);
            }
            self.entries.remove(file);
            graph.clear(file);
        }

        self.mark_stale_dependents(graph);
        evicted
    }

    /// Flag every transitive dependent of a stale template.
    pub fn mark_stale_dependents(&mut self, graph: &DependencyGraph) {
        let roots: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.stale && entry.contract.is_some())
            .map(|(file, _)| file.clone())
            .collect();

        for root in roots {
            for dependent in graph.dependents_of(&root) {
                if self.mark_stale(&dependent) {
                    debug!("{} is stale because {} changed", dependent.display(), root.display());
                } else {
                    debug!("Dependent {} of {} is not cached", dependent.display(), root.display());
                }
            }
        }
    }

    /// Total number of cached errors.
    pub fn error_count(&self) -> usize {
        self.entries.values().map(|entry| entry.errors.len()).sum()
    }
}
