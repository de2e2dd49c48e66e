use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::IndexerConfig;
use crate::indexer::TemplateIndexer;
use crate::scanner::{LibraryScanner, PackageSource, ScanDriver, ScanResult};
use crate::storage::TemplateRegistry;

/// Response envelope handed to a query continuation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub result: Value,
}

impl QueryResponse {
    pub fn success(result: Value) -> Self {
        Self {
            success: true,
            result,
        }
    }
}

/// Owns the template indexer and its scan driver.
pub struct TemplateService {
    config: IndexerConfig,
    indexer: Arc<TemplateIndexer>,
    driver: ScanDriver,
}

impl TemplateService {
    pub fn new(config: IndexerConfig, source: Arc<dyn PackageSource>) -> Self {
        let indexer = Arc::new(TemplateIndexer::new(config.local_templates_path()));
        let driver = ScanDriver::new(source, config.resource_path.clone())
            .with_batch_size(config.effective_batch_size());

        Self {
            config,
            indexer,
            driver,
        }
    }

    /// Service over the library directories named by `config`.
    pub fn from_config(config: IndexerConfig) -> Self {
        let scanner = LibraryScanner::new(config.effective_library_paths());
        Self::new(config, Arc::new(scanner))
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn indexer(&self) -> &Arc<TemplateIndexer> {
        &self.indexer
    }

    /// Startup hook: begin the first scan unless packages are disabled.
    pub fn on_deferred_init(&self) -> Option<JoinHandle<ScanResult>> {
        if self.config.disable_packages {
            info!("Package scanning disabled; project template registry not built");
            return None;
        }
        self.start_scan()
    }

    /// Start a scan; `None` if one is already running.
    pub fn start_scan(&self) -> Option<JoinHandle<ScanResult>> {
        self.driver.start(self.indexer.clone())
    }

    pub fn running(&self) -> bool {
        self.indexer.is_scanning()
    }

    /// Query entry point. `continuation` receives the serialized registry,
    /// immediately when idle or once the in-flight scan has published.
    pub fn get_project_template_registry<F>(&self, continuation: F)
    where
        F: FnOnce(QueryResponse) + Send + 'static,
    {
        self.indexer.with_registry(move |registry| {
            continuation(QueryResponse::success(registry.to_json()));
        });
    }

    /// Published registry, waiting for an in-flight scan first.
    pub async fn registry(&self) -> Arc<TemplateRegistry> {
        self.indexer.wait_for_registry().await
    }
}
