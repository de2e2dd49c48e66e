use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::completion::{CompletionQueue, PendingCallback};
use crate::error::{Result, TemplateError};
use crate::parser::{normalize_line_endings, parse_templates};
use crate::scanner::IndexWorker;
use crate::storage::TemplateRegistry;
use crate::types::{TemplateDescription, LOCAL_OWNER};

/// Templates shipped with the indexer: (package, binding, title, description).
///
/// A package declaring a template with the same binding replaces the
/// built-in entry.
pub const BUILTIN_TEMPLATES: [(&str, &str, &str, &str); 4] = [
    (
        "devtools",
        "create",
        "Create an R Package using devtools",
        "Create a new R package following the devtools development conventions.",
    ),
    (
        "Rcpp",
        "Rcpp.package.skeleton",
        "Create an R Package using Rcpp",
        "Create a new R package using Rcpp.",
    ),
    (
        "RcppArmadillo",
        "RcppArmadillo.package.skeleton",
        "Create an R Package using RcppArmadillo",
        "Create a new R package using RcppArmadillo.",
    ),
    (
        "RcppEigen",
        "RcppEigen.package.skeleton",
        "Create an R Package using RcppEigen",
        "Create a new R package using RcppEigen.",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPhase {
    Idle,
    Scanning,
}

#[derive(Debug)]
struct IndexerState {
    phase: IndexPhase,
    waiting: CompletionQueue,
    scans_completed: u64,
}

/// Builds the project template registry from package resource files.
///
/// Each scan fills a private staging registry; the published registry is
/// swapped in whole when the scan completes, so readers only ever see a
/// finished registry.
#[derive(Debug)]
pub struct TemplateIndexer {
    local_templates_path: Option<PathBuf>,
    state: Mutex<IndexerState>,
    staging: Mutex<Option<TemplateRegistry>>,
    published: RwLock<Arc<TemplateRegistry>>,
}

impl TemplateIndexer {
    /// `local_templates_path` is the user's own template file, indexed under
    /// [`LOCAL_OWNER`] when it exists.
    pub fn new(local_templates_path: Option<PathBuf>) -> Self {
        Self {
            local_templates_path,
            state: Mutex::new(IndexerState {
                phase: IndexPhase::Idle,
                waiting: CompletionQueue::new(),
                scans_completed: 0,
            }),
            staging: Mutex::new(None),
            published: RwLock::new(Arc::new(TemplateRegistry::new())),
        }
    }

    pub fn phase(&self) -> IndexPhase {
        self.state.lock().phase
    }

    pub fn is_scanning(&self) -> bool {
        self.phase() == IndexPhase::Scanning
    }

    pub fn scans_completed(&self) -> u64 {
        self.state.lock().scans_completed
    }

    pub fn pending_callbacks(&self) -> usize {
        self.state.lock().waiting.len()
    }

    /// Current published registry
    pub fn registry(&self) -> Arc<TemplateRegistry> {
        Arc::clone(&self.published.read())
    }

    /// Run `callback` once no scan is in flight.
    ///
    /// When idle the callback runs immediately on the calling thread and
    /// `true` is returned. Otherwise it is queued until the current scan has
    /// published, and `false` is returned.
    pub fn when_idle(&self, callback: PendingCallback) -> bool {
        {
            let mut state = self.state.lock();
            if state.phase == IndexPhase::Scanning {
                state.waiting.enqueue(callback);
                return false;
            }
        }
        callback();
        true
    }

    /// Hand the published registry to `callback`, waiting for an in-flight
    /// scan to finish first.
    pub fn with_registry<F>(self: &Arc<Self>, callback: F) -> bool
    where
        F: FnOnce(Arc<TemplateRegistry>) + Send + 'static,
    {
        let indexer = Arc::clone(self);
        self.when_idle(Box::new(move || callback(indexer.registry())))
    }

    /// Future form of [`Self::with_registry`].
    pub async fn wait_for_registry(self: &Arc<Self>) -> Arc<TemplateRegistry> {
        let (tx, rx) = oneshot::channel();
        self.with_registry(move |registry| {
            let _ = tx.send(registry);
        });
        match rx.await {
            Ok(registry) => registry,
            Err(_) => self.registry(),
        }
    }

    /// Parse one resource file and add its valid templates to the staging
    /// registry under `package`.
    ///
    /// Bad blocks are logged and skipped. Returns how many templates were
    /// added.
    pub fn index_file(&self, package: &str, path: &Path) -> Result<usize> {
        let bytes = std::fs::read(path).map_err(|e| TemplateError::io(path, e))?;
        // Stray non-UTF-8 bytes only spoil the block they sit in
        let contents = normalize_line_endings(&String::from_utf8_lossy(&bytes));

        let mut templates = Vec::new();
        for parsed in parse_templates(package, &contents) {
            match parsed {
                Ok(template) => templates.push(template),
                Err(e) => warn!(package, path = %path.display(), error = %e, "Skipping template block"),
            }
        }

        let added = templates.len();
        let mut staging = self.staging.lock();
        let registry = staging.get_or_insert_with(TemplateRegistry::new);
        for template in templates {
            registry.add(package, template);
        }

        Ok(added)
    }

    fn index_local_templates(&self) {
        let Some(path) = self.local_templates_path.as_deref() else {
            return;
        };
        if path.is_file() {
            self.on_work(LOCAL_OWNER, path);
        }
    }

    fn publish(&self, registry: TemplateRegistry) {
        *self.published.write() = Arc::new(registry);
    }
}

/// Add each built-in template unless its package already registered the
/// same binding. Returns how many were added.
pub fn merge_builtin_templates(registry: &mut TemplateRegistry) -> usize {
    let mut added = 0;
    for (package, binding, title, description) in BUILTIN_TEMPLATES {
        let template = TemplateDescription::new(package, binding, title, description);
        if registry.add_if_binding_absent(template) {
            added += 1;
        }
    }
    added
}

impl IndexWorker for TemplateIndexer {
    fn on_indexing_started(&self) {
        *self.staging.lock() = Some(TemplateRegistry::new());
        self.state.lock().phase = IndexPhase::Scanning;
        info!("Project template indexing started");
    }

    fn on_work(&self, package: &str, resource_path: &Path) {
        match self.index_file(package, resource_path) {
            Ok(count) => debug!(package, count, "Indexed project templates"),
            Err(e) => warn!(package, error = %e, "Failed to index project templates"),
        }
    }

    fn on_indexing_completed(&self) {
        self.index_local_templates();

        let mut registry = self.staging.lock().take().unwrap_or_default();
        let builtins = merge_builtin_templates(&mut registry);
        let metadata = registry.metadata();
        self.publish(registry);

        let callbacks = {
            let mut state = self.state.lock();
            state.phase = IndexPhase::Idle;
            state.scans_completed += 1;
            state.waiting.take()
        };

        info!(
            owners = metadata.total_owners,
            templates = metadata.total_templates,
            builtins,
            waiting = callbacks.len(),
            "Project template indexing completed"
        );

        for callback in callbacks {
            callback();
        }
    }

    fn on_indexing_aborted(&self) {
        self.staging.lock().take();

        let callbacks = {
            let mut state = self.state.lock();
            if state.phase == IndexPhase::Idle {
                return;
            }
            state.phase = IndexPhase::Idle;
            state.waiting.take()
        };

        warn!(
            waiting = callbacks.len(),
            "Project template indexing aborted; keeping previous registry"
        );

        for callback in callbacks {
            callback();
        }
    }
}
