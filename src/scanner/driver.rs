use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::discovery::PackageSource;

/// Receives the events of a package scan.
///
/// `on_work` may be called concurrently from several blocking threads.
/// `on_indexing_completed` is called once, after every `on_work` call of
/// the same scan has returned. A scan that panics or is aborted before it
/// completes gets `on_indexing_aborted` instead.
pub trait IndexWorker: Send + Sync + 'static {
    fn on_indexing_started(&self);
    fn on_work(&self, package: &str, resource_path: &Path);
    fn on_indexing_completed(&self);
    fn on_indexing_aborted(&self);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub packages_scanned: usize,
    pub resources_found: usize,
    pub duration: Duration,
}

/// Walks every installed package looking for one resource file, handing
/// each match to an [`IndexWorker`].
///
/// Only one scan runs at a time.
pub struct ScanDriver {
    source: Arc<dyn PackageSource>,
    resource_path: PathBuf,
    batch_size: usize,
    running: Arc<AtomicBool>,
}

impl ScanDriver {
    pub fn new(source: Arc<dyn PackageSource>, resource_path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            resource_path: resource_path.into(),
            batch_size: num_cpus::get().max(1),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Number of packages processed before yielding back to the runtime
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Begin a scan on the current tokio runtime.
    ///
    /// `on_indexing_started` runs before this returns. Returns `None` when a
    /// scan is already running.
    pub fn start(&self, worker: Arc<dyn IndexWorker>) -> Option<JoinHandle<ScanResult>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Scan already running; ignoring start request");
            return None;
        }

        worker.on_indexing_started();

        let source = Arc::clone(&self.source);
        let resource_path = self.resource_path.clone();
        let batch_size = self.batch_size;
        let running = Arc::clone(&self.running);

        let mut guard = ScanGuard {
            running,
            worker: Some(Arc::clone(&worker)),
        };

        Some(tokio::spawn(async move {
            let result = run_scan(source, worker, resource_path, batch_size).await;
            guard.disarm();
            result
        }))
    }
}

/// Clears the running flag when the scan task ends, however it ends.
///
/// Dropped while still armed means the task panicked or was aborted, so the
/// worker is told the scan will never complete.
struct ScanGuard {
    running: Arc<AtomicBool>,
    worker: Option<Arc<dyn IndexWorker>>,
}

impl ScanGuard {
    fn disarm(&mut self) {
        self.worker = None;
    }
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            warn!("Scan task ended before completing");
            worker.on_indexing_aborted();
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

async fn run_scan(
    source: Arc<dyn PackageSource>,
    worker: Arc<dyn IndexWorker>,
    resource_path: PathBuf,
    batch_size: usize,
) -> ScanResult {
    let start_time = Instant::now();

    let packages = match source.list_packages().await {
        Ok(packages) => packages,
        Err(e) => {
            warn!(error = %e, "Package enumeration failed; indexing nothing");
            Vec::new()
        }
    };
    info!(packages = packages.len(), resource = %resource_path.display(), "Scanning packages");

    let mut resources_found = 0;
    for batch in packages.chunks(batch_size) {
        let mut tasks = Vec::with_capacity(batch.len());

        for package in batch {
            let candidate = package.path.join(&resource_path);
            if !is_file(&candidate).await {
                continue;
            }
            resources_found += 1;

            let worker = Arc::clone(&worker);
            let name = package.name.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                worker.on_work(&name, &candidate)
            }));
        }

        for outcome in join_all(tasks).await {
            if let Err(e) = outcome {
                warn!(error = %e, "Package indexing task failed");
            }
        }

        tokio::task::yield_now().await;
    }

    // Completion may read the user's local file, keep it off the async threads
    let completion = Arc::clone(&worker);
    if let Err(e) = tokio::task::spawn_blocking(move || completion.on_indexing_completed()).await {
        warn!(error = %e, "Indexing completion failed");
        worker.on_indexing_aborted();
    }

    ScanResult {
        packages_scanned: packages.len(),
        resources_found,
        duration: start_time.elapsed(),
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use crate::scanner::discovery::MockPackageSource;
    use crate::types::InstalledPackage;
    use parking_lot::Mutex;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingWorker {
        events: Mutex<Vec<String>>,
    }

    impl IndexWorker for RecordingWorker {
        fn on_indexing_started(&self) {
            self.events.lock().push("started".to_string());
        }

        fn on_work(&self, package: &str, resource_path: &Path) {
            assert!(resource_path.is_file());
            self.events.lock().push(format!("work:{}", package));
        }

        fn on_indexing_completed(&self) {
            self.events.lock().push("completed".to_string());
        }

        fn on_indexing_aborted(&self) {
            self.events.lock().push("aborted".to_string());
        }
    }

    fn library_with(packages: &[(&str, bool)]) -> (TempDir, Vec<InstalledPackage>) {
        let dir = TempDir::new().unwrap();
        let mut installed = Vec::new();
        for (name, has_resource) in packages {
            let package_dir = dir.path().join(name);
            fs::create_dir_all(package_dir.join("rstudio")).unwrap();
            if *has_resource {
                fs::write(package_dir.join("rstudio/project_templates.dcf"), "binding: x").unwrap();
            }
            installed.push(InstalledPackage::new(*name, package_dir));
        }
        (dir, installed)
    }

    #[tokio::test]
    async fn test_only_packages_with_resource_get_work() {
        let (_dir, installed) = library_with(&[("a", true), ("b", false), ("c", true)]);
        let mut source = MockPackageSource::new();
        source
            .expect_list_packages()
            .times(1)
            .returning(move || Ok(installed.clone()));

        let driver = ScanDriver::new(Arc::new(source), "rstudio/project_templates.dcf").with_batch_size(2);
        let worker = Arc::new(RecordingWorker::default());

        let result = driver.start(worker.clone()).unwrap().await.unwrap();
        assert_eq!(result.packages_scanned, 3);
        assert_eq!(result.resources_found, 2);
        assert!(!driver.running());

        let events = worker.events.lock().clone();
        assert_eq!(events.first().map(String::as_str), Some("started"));
        assert_eq!(events.last().map(String::as_str), Some("completed"));
        assert!(events.contains(&"work:a".to_string()));
        assert!(events.contains(&"work:c".to_string()));
        assert!(!events.contains(&"work:b".to_string()));
    }

    #[tokio::test]
    async fn test_second_start_is_ignored_while_running() {
        let (_dir, installed) = library_with(&[("a", true)]);
        let mut source = MockPackageSource::new();
        source
            .expect_list_packages()
            .times(1)
            .returning(move || Ok(installed.clone()));

        let driver = ScanDriver::new(Arc::new(source), "rstudio/project_templates.dcf");
        let worker = Arc::new(RecordingWorker::default());

        let handle = driver.start(worker.clone()).unwrap();
        assert!(driver.running());
        assert!(driver.start(worker.clone()).is_none());

        handle.await.unwrap();
        let started = worker.events.lock().iter().filter(|e| *e == "started").count();
        assert_eq!(started, 1);
    }

    #[tokio::test]
    async fn test_enumeration_failure_still_completes() {
        let mut source = MockPackageSource::new();
        source.expect_list_packages().returning(|| {
            Err(TemplateError::Enumeration {
                path: PathBuf::from("/lib"),
                message: "boom".to_string(),
            })
        });

        let driver = ScanDriver::new(Arc::new(source), "rstudio/project_templates.dcf");
        let worker = Arc::new(RecordingWorker::default());

        let result = driver.start(worker.clone()).unwrap().await.unwrap();
        assert_eq!(result.packages_scanned, 0);
        assert_eq!(*worker.events.lock(), vec!["started".to_string(), "completed".to_string()]);
    }

    /// Panics on its first listing, then lists nothing.
    #[derive(Default)]
    struct PanicOnceSource {
        panicked: AtomicBool,
    }

    #[async_trait::async_trait]
    impl PackageSource for PanicOnceSource {
        async fn list_packages(&self) -> crate::error::Result<Vec<InstalledPackage>> {
            if !self.panicked.swap(true, Ordering::SeqCst) {
                panic!("package listing exploded");
            }
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_panicking_source_releases_running_flag() {
        let driver = ScanDriver::new(Arc::new(PanicOnceSource::default()), "rstudio/project_templates.dcf");
        let worker = Arc::new(RecordingWorker::default());

        let outcome = driver.start(worker.clone()).unwrap().await;
        assert!(outcome.unwrap_err().is_panic());
        assert!(!driver.running());
        assert_eq!(*worker.events.lock(), vec!["started".to_string(), "aborted".to_string()]);

        // A later scan runs normally
        let result = driver.start(worker.clone()).unwrap().await.unwrap();
        assert_eq!(result.packages_scanned, 0);
        assert_eq!(worker.events.lock().last().map(String::as_str), Some("completed"));
    }

    #[tokio::test]
    async fn test_aborted_scan_notifies_worker() {
        let mut source = MockPackageSource::new();
        source.expect_list_packages().returning(|| Ok(Vec::new()));

        let driver = ScanDriver::new(Arc::new(source), "rstudio/project_templates.dcf");
        let worker = Arc::new(RecordingWorker::default());

        // Aborted before the task is ever polled
        let handle = driver.start(worker.clone()).unwrap();
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        assert!(!driver.running());
        assert_eq!(*worker.events.lock(), vec!["started".to_string(), "aborted".to_string()]);
    }
}
