//! The checking pipeline.
//!
//! A [`Checker`] owns everything one run needs: configuration, the dependency
//! graph, the parse result cache, the shared-locals type and the engine. For
//! each template it runs
//!
//! ```text
//! extract contract -> resolve tree -> generate program -> engine -> remap
//! ```
//!
//! and stores the collected errors in the cache. Nothing in the pipeline
//! aborts on a template problem; only process-level failures (unreadable
//! configuration, no templates) are returned as `Err`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cache::{ParseResultCache, persist};
use crate::codegen::{SyntheticProgram, generate};
use crate::config::Config;
use crate::contract::{Contract, extract, is_template_path};
use crate::core::PugcheckError;
use crate::diagnostics::{ErrorKind, TemplateError, remap_all};
use crate::engine::TypeCheckEngine;
use crate::resolver::{DependencyGraph, TemplateResolver};
use crate::shared_locals::SharedLocals;
use crate::template::TemplateNode;
use crate::utils::fs::{find_templates, normalize_path};

/// Outcome of checking a set of templates.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// Errors per template, for every template in the run.
    pub results: BTreeMap<PathBuf, Vec<TemplateError>>,
    /// Templates actually reprocessed (the rest came from the cache).
    pub processed: Vec<PathBuf>,
}

impl CheckReport {
    pub fn template_count(&self) -> usize {
        self.results.len()
    }

    pub fn error_count(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.results.values().filter(|errors| !errors.is_empty()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// Output of [`Checker::generate`].
#[derive(Debug, Clone)]
pub struct Generated {
    /// Resolved tree; `None` when resolution stopped on a structural error.
    pub tree: Option<Vec<TemplateNode>>,
    pub program: Option<SyntheticProgram>,
    pub errors: Vec<TemplateError>,
}

/// Owns the graph, cache and engine for one run.
pub struct Checker {
    config: Config,
    graph: DependencyGraph,
    cache: ParseResultCache,
    engine: Box<dyn TypeCheckEngine>,
    shared: Option<SharedLocals>,
    use_cache: bool,
}

impl Checker {
    /// Build a checker. The shared-locals type is loaded here when configured.
    pub fn new(config: Config, engine: Box<dyn TypeCheckEngine>) -> Result<Self> {
        let shared = match &config.shared_locals {
            Some(settings) => Some(SharedLocals::load(&settings.import_path, &settings.type_name)?),
            None => None,
        };
        Ok(Self {
            config,
            graph: DependencyGraph::new(),
            cache: ParseResultCache::new(),
            engine,
            shared,
            use_cache: true,
        })
    }

    /// Disable reuse of cached results; every template is reprocessed.
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn cache(&self) -> &ParseResultCache {
        &self.cache
    }

    /// Load the persisted cache and re-derive staleness from file times.
    ///
    /// An unreadable cache is discarded with a warning.
    pub fn load_cache(&mut self) {
        if !self.use_cache {
            return;
        }
        match persist::load(&self.config.cache_path) {
            Ok(Some((cache, graph))) => {
                self.cache = cache;
                self.graph = graph;
                let evicted = self.cache.mark_stale_files(&mut self.graph);
                debug!(
                    "{} stale, {} evicted after loading cache",
                    self.cache.stale_files().len(),
                    evicted.len()
                );
            }
            Ok(None) => debug!("No cache at {}", self.config.cache_path.display()),
            Err(e) => warn!("Ignoring unreadable cache: {e:#}"),
        }
    }

    /// Persist the cache and graph.
    pub fn save_cache(&self) -> Result<()> {
        persist::save(&self.cache, &self.graph, &self.config.cache_path)
    }

    /// Check every template under `roots` (the configured template paths when
    /// empty), reusing fresh cached results.
    pub fn scan_all(&mut self, roots: &[PathBuf]) -> Result<CheckReport> {
        let roots = if roots.is_empty() {
            self.config.template_paths.clone()
        } else {
            roots.to_vec()
        };
        let templates = find_templates(&roots)?;
        if templates.is_empty() {
            return Err(PugcheckError::NoTemplates {
                paths: roots.iter().map(|p| p.display().to_string()).collect(),
            }
            .into());
        }

        let mut report = CheckReport::default();
        for template in &templates {
            if !self.use_cache || self.cache.needs_processing(template, self.engine.name()) {
                self.scan_file(template);
                report.processed.push(template.clone());
            }
        }
        for template in templates {
            let errors = self.cache.get(&template).map(|entry| entry.errors.clone()).unwrap_or_default();
            report.results.insert(template, errors);
        }

        info!(
            "Checked {} template(s), {} reprocessed, {} error(s)",
            report.template_count(),
            report.processed.len(),
            report.error_count()
        );
        Ok(report)
    }

    /// Run the whole pipeline for one template and cache the result.
    pub fn scan_file(&mut self, path: &Path) -> Vec<TemplateError> {
        let path = normalize_path(path);
        debug!("Scanning {}", path.display());

        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                let errors = vec![TemplateError::new(ErrorKind::MissingFile, &path, None, format!("cannot read template: {e}"))];
                self.graph.clear(&path);
                self.cache.set(&path, self.engine.name(), errors.clone(), None);
                return errors;
            }
        };

        let (tree, contract, mut errors) = self.build(&path, &source);
        if let Some(tree) = tree {
            let program = generate(&tree, &contract, self.shared.as_ref());
            errors.extend(self.type_check(&program));
        }

        self.cache.track_inputs(self.graph.get(&path));
        self.cache.set(&path, self.engine.name(), errors.clone(), Some(contract));
        errors
    }

    /// Resolve and generate one template without type checking or caching.
    pub fn generate(&mut self, path: &Path) -> Result<Generated> {
        let path = normalize_path(path);
        if !is_template_path(&path) {
            return Err(PugcheckError::NotATemplate {
                path,
            }
            .into());
        }
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read template: {}", path.display()))?;
        let (tree, contract, errors) = self.build(&path, &source);
        let program = tree.as_ref().map(|tree| generate(tree, &contract, self.shared.as_ref()));
        Ok(Generated {
            tree,
            program,
            errors,
        })
    }

    /// Handle an external change notification for `path`.
    ///
    /// A template is rechecked along with everything that depends on it. Any
    /// other file (an imported type module, a raw include) rechecks its
    /// dependents. A deleted template is evicted. Returns the reprocessed
    /// templates.
    pub fn notify_changed(&mut self, path: &Path) -> Vec<PathBuf> {
        let path = normalize_path(path);
        let dependents = self.graph.dependents_of(&path);
        let mut processed = Vec::new();

        if is_template_path(&path) {
            if path.is_file() {
                self.scan_file(&path);
                processed.push(path.clone());
            } else if self.cache.remove(&path).is_some() {
                debug!("{} was deleted; evicting", path.display());
                self.graph.clear(&path);
            }
        }

        for dependent in dependents {
            self.cache.mark_stale(&dependent);
            if dependent.is_file() {
                self.scan_file(&dependent);
                processed.push(dependent);
            }
        }

        info!("{} changed; reprocessed {} template(s)", path.display(), processed.len());
        processed
    }

    /// Extract and resolve. Records graph edges for `path`, including one to
    /// the shared-locals declaration when configured.
    fn build(&mut self, path: &Path, source: &str) -> (Option<Vec<TemplateNode>>, Contract, Vec<TemplateError>) {
        self.graph.clear(path);

        let (contract, mut errors) = extract(source, path, &self.config.views_root);
        errors.extend(self.record_imports(&contract));
        if let Some(shared) = &self.shared {
            self.graph.add(path, &shared.import_path);
        }

        let resolution = TemplateResolver::new(&mut self.graph, &self.config.views_root).resolve(path, Some(source));
        errors.extend(resolution.errors);

        (resolution.tree, contract, errors)
    }

    /// Add an edge to each imported module file; report path imports that
    /// resolve to nothing.
    fn record_imports(&mut self, contract: &Contract) -> Vec<TemplateError> {
        let mut errors = Vec::new();
        for import in contract.imports.iter().filter(|import| import.is_path_reference()) {
            match import.resolve_module_file() {
                Some(file) => self.graph.add(&contract.template_path, &file),
                None => errors.push(TemplateError::at(
                    ErrorKind::MissingFile,
                    &contract.template_path,
                    import.line,
                    format!(
                        "cannot find module `{}` (looked for {})",
                        import.module,
                        import.absolute_module_path().display()
                    ),
                )),
            }
        }
        errors
    }

    fn type_check(&self, program: &SyntheticProgram) -> Vec<TemplateError> {
        match self.engine.check(program) {
            Ok(diagnostics) => {
                debug!(
                    "{} reported {} diagnostic(s) for {}",
                    self.engine.name(),
                    diagnostics.len(),
                    program.template_path.display()
                );
                remap_all(&diagnostics, program, &self.engine.program_file(program))
            }
            Err(e) => vec![TemplateError::new(
                ErrorKind::Engine,
                &program.template_path,
                None,
                format!("{} failed: {e:#}", self.engine.name()),
            )],
        }
    }
}
